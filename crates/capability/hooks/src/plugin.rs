//! 插件生命周期：显式加载/卸载，所有协作方通过上下文传入。

use crate::error::PluginError;
use crate::forward::Forwarder;
use crate::gate::{PrivilegedCredentials, TopicGateHook};
use crate::hook::{Hook, HookPipeline};
use crate::identity::IdentityResolver;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tg_devdebug::DebugLogSink;
use tg_storage::{DeviceStore, KvStore, MappingRuleStore};
use tg_topicmap::{MappingCache, MappingRepository, MappingService};
use tokio::sync::OnceCell;
use tracing::info;

pub const PLUGIN_NAME: &str = "thingspanel";

/// 插件运行所需的全部协作方。
#[derive(Clone)]
pub struct PluginContext {
    pub devices: Arc<dyn DeviceStore>,
    pub rules: Arc<dyn MappingRuleStore>,
    pub kv: Arc<dyn KvStore>,
    pub forwarder: Arc<dyn Forwarder>,
    pub credentials: PrivilegedCredentials,
    pub cache_ttl_seconds: u64,
    /// 排在主题网关之前执行的 Hook（例如宿主中更早注册的插件）
    pub upstream_hooks: Vec<Arc<dyn Hook>>,
    /// 预先构造的调试日志写入器；None 时基于 `kv` 与系统时间创建
    pub debug_sink: Option<DebugLogSink>,
}

/// 加载后的运行实例。
#[derive(Clone)]
pub struct PluginRuntime {
    pub pipeline: HookPipeline,
    pub mappings: MappingService,
    pub debug_log: DebugLogSink,
}

impl PluginRuntime {
    fn build(context: PluginContext) -> Result<Self, PluginError> {
        if context.credentials.root_password.is_empty()
            || context.credentials.plugin_password.is_empty()
        {
            return Err(PluginError::Config(
                "privileged passwords must not be empty".to_string(),
            ));
        }
        let repository = MappingRepository::new(context.rules);
        let cache = MappingCache::with_ttl(context.kv.clone(), repository, context.cache_ttl_seconds);
        let mappings = MappingService::new(cache);
        let debug_log = context
            .debug_sink
            .unwrap_or_else(|| DebugLogSink::new(context.kv.clone()));
        let identity = IdentityResolver::new(context.devices, context.kv);
        let gate = TopicGateHook::new(
            identity,
            mappings.clone(),
            debug_log.clone(),
            context.forwarder,
            context.credentials,
        );

        let mut pipeline = HookPipeline::new();
        for hook in context.upstream_hooks {
            pipeline = pipeline.with_hook(hook);
        }
        let pipeline = pipeline.with_hook(Arc::new(gate));
        Ok(Self {
            pipeline,
            mappings,
            debug_log,
        })
    }
}

/// 主题网关插件。
#[derive(Default)]
pub struct Plugin {
    runtime: OnceCell<Result<Arc<PluginRuntime>, PluginError>>,
    unloaded: AtomicBool,
}

impl Plugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    /// 初始化插件；重复调用返回第一次的结果。
    pub async fn load(&self, context: PluginContext) -> Result<Arc<PluginRuntime>, PluginError> {
        if self.unloaded.load(Ordering::SeqCst) {
            return Err(PluginError::Unloaded);
        }
        self.runtime
            .get_or_init(|| async move {
                let runtime = PluginRuntime::build(context).map(Arc::new);
                if runtime.is_ok() {
                    info!(target: "tg.hooks", plugin = PLUGIN_NAME, "plugin_loaded");
                }
                runtime
            })
            .await
            .clone()
    }

    /// 当前运行实例；未加载、加载失败或已卸载时为 None。
    pub fn runtime(&self) -> Option<Arc<PluginRuntime>> {
        if self.unloaded.load(Ordering::SeqCst) {
            return None;
        }
        self.runtime.get().and_then(|runtime| runtime.clone().ok())
    }

    pub async fn unload(&self) -> Result<(), PluginError> {
        self.unloaded.store(true, Ordering::SeqCst);
        info!(target: "tg.hooks", plugin = PLUGIN_NAME, "plugin_unloaded");
        Ok(())
    }
}
