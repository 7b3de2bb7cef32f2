//! 追踪初始化、请求 ID 生成与 Hook 结果计数。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// Hook 结果计数快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookMetricsSnapshot {
    pub auth_ok: u64,
    pub auth_denied: u64,
    pub subscribe_ok: u64,
    pub subscribe_denied: u64,
    pub publish_ok: u64,
    pub publish_denied: u64,
    pub publish_redirected: u64,
    pub down_forwarded: u64,
    pub forward_failures: u64,
}

/// Hook 结果计数（进程内，不负责导出）。
pub struct HookMetrics {
    auth_ok: AtomicU64,
    auth_denied: AtomicU64,
    subscribe_ok: AtomicU64,
    subscribe_denied: AtomicU64,
    publish_ok: AtomicU64,
    publish_denied: AtomicU64,
    publish_redirected: AtomicU64,
    down_forwarded: AtomicU64,
    forward_failures: AtomicU64,
}

impl HookMetrics {
    pub fn new() -> Self {
        Self {
            auth_ok: AtomicU64::new(0),
            auth_denied: AtomicU64::new(0),
            subscribe_ok: AtomicU64::new(0),
            subscribe_denied: AtomicU64::new(0),
            publish_ok: AtomicU64::new(0),
            publish_denied: AtomicU64::new(0),
            publish_redirected: AtomicU64::new(0),
            down_forwarded: AtomicU64::new(0),
            forward_failures: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> HookMetricsSnapshot {
        HookMetricsSnapshot {
            auth_ok: self.auth_ok.load(Ordering::Relaxed),
            auth_denied: self.auth_denied.load(Ordering::Relaxed),
            subscribe_ok: self.subscribe_ok.load(Ordering::Relaxed),
            subscribe_denied: self.subscribe_denied.load(Ordering::Relaxed),
            publish_ok: self.publish_ok.load(Ordering::Relaxed),
            publish_denied: self.publish_denied.load(Ordering::Relaxed),
            publish_redirected: self.publish_redirected.load(Ordering::Relaxed),
            down_forwarded: self.down_forwarded.load(Ordering::Relaxed),
            forward_failures: self.forward_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for HookMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<HookMetrics> = OnceLock::new();

/// 获取全局计数实例。
pub fn metrics() -> &'static HookMetrics {
    METRICS.get_or_init(HookMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录鉴权结果。
pub fn record_auth(ok: bool) {
    let metrics = metrics();
    if ok {
        metrics.auth_ok.fetch_add(1, Ordering::Relaxed);
    } else {
        metrics.auth_denied.fetch_add(1, Ordering::Relaxed);
    }
}

/// 记录订阅校验结果。
pub fn record_subscribe(ok: bool) {
    let metrics = metrics();
    if ok {
        metrics.subscribe_ok.fetch_add(1, Ordering::Relaxed);
    } else {
        metrics.subscribe_denied.fetch_add(1, Ordering::Relaxed);
    }
}

/// 记录发布放行次数。
pub fn record_publish_ok() {
    metrics().publish_ok.fetch_add(1, Ordering::Relaxed);
}

/// 记录发布拒绝次数。
pub fn record_publish_denied() {
    metrics().publish_denied.fetch_add(1, Ordering::Relaxed);
}

/// 记录上行自定义映射重定向（原消息丢弃）次数。
pub fn record_publish_redirected() {
    metrics().publish_redirected.fetch_add(1, Ordering::Relaxed);
}

/// 记录下行自定义主题额外转发次数。
pub fn record_down_forwarded() {
    metrics().down_forwarded.fetch_add(1, Ordering::Relaxed);
}

/// 记录转发失败次数。
pub fn record_forward_failure() {
    metrics().forward_failures.fetch_add(1, Ordering::Relaxed);
}
