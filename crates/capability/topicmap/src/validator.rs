//! 静态主题校验：平台规范主题的固定白名单。
//!
//! 按段数严格相等 + 逐段比较，不做变量捕获，不支持 `#`。

use crate::matcher::{CompileMode, TopicPattern};
use std::sync::LazyLock;

/// 设备允许发布的规范主题。
pub const PUBLISH_TOPICS: &[&str] = &[
    "devices/telemetry/control",         // 遥测上报
    "devices/attributes/+",              // 属性上报
    "devices/event/+",                   // 事件上报
    "ota/device/progress",               // 升级进度
    "devices/attributes/set/response/+", // 属性设置响应
    "devices/command/response/+",        // 命令响应
    "gateway/telemetry/control",
    "gateway/attributes/+",
    "gateway/event/+",
    "gateway/attributes/set/response/+",
    "gateway/command/response/+",
    "+/up",
];

/// 设备允许订阅的规范主题。
pub const SUBSCRIBE_TOPICS: &[&str] = &[
    "devices/telemetry/control/{device_number}",
    "devices/telemetry/control/{device_number}/+",
    "devices/attributes/set/{device_number}/+",
    "devices/attributes/get/{device_number}",
    "devices/command/{device_number}/+",
    "ota/devices/infrom/{device_number}",
    "devices/attributes/response/{device_number}/+",
    "devices/event/response/{device_number}/+",
    "gateway/telemetry/control/{device_number}",
    "gateway/attributes/set/{device_number}/+",
    "gateway/attributes/get/{device_number}",
    "gateway/command/{device_number}/+",
    "gateway/attributes/response/{device_number}/+",
    "gateway/event/response/{device_number}/+",
    "{device_number}/down",
    "devices/register/response/+",
    "devices/config/down/response/+",
];

const WILDCARD: &str = "+";
const MULTI_LEVEL: &str = "#";
const DEVICE_NUMBER_SEGMENT: &str = "{device_number}";

/// 发布主题是否在白名单内。
pub fn validate_publish(topic: &str) -> bool {
    PUBLISH_TOPICS
        .iter()
        .any(|pattern| matches_publish_pattern(topic, pattern))
}

/// 订阅主题是否在白名单内。
pub fn validate_subscribe(topic: &str) -> bool {
    SUBSCRIBE_TOPICS
        .iter()
        .any(|pattern| matches_subscribe_pattern(topic, pattern))
}

fn matches_publish_pattern(topic: &str, pattern: &str) -> bool {
    let topic_parts: Vec<&str> = topic.split('/').collect();
    let pattern_parts: Vec<&str> = pattern.split('/').collect();
    if topic_parts.len() != pattern_parts.len() {
        return false;
    }
    topic_parts
        .iter()
        .zip(&pattern_parts)
        .all(|(topic_part, pattern_part)| *pattern_part == WILDCARD || topic_part == pattern_part)
}

fn matches_subscribe_pattern(topic: &str, pattern: &str) -> bool {
    let topic_parts: Vec<&str> = topic.split('/').collect();
    let pattern_parts: Vec<&str> = pattern.split('/').collect();
    if topic_parts.len() != pattern_parts.len() {
        return false;
    }
    topic_parts
        .iter()
        .zip(&pattern_parts)
        .all(|(topic_part, pattern_part)| match *pattern_part {
            // 设备编号段必须是具体值
            DEVICE_NUMBER_SEGMENT => *topic_part != WILDCARD && *topic_part != MULTI_LEVEL,
            WILDCARD => *topic_part != MULTI_LEVEL,
            literal => *topic_part == literal,
        })
}

/// 平台下发使用的规范下行主题（可从中提取设备编号）。
///
/// 即订阅白名单中带 `{device_number}` 的模板，排除过于宽泛的 `{device_number}/down`。
pub fn normalized_down_topics() -> impl Iterator<Item = &'static str> {
    SUBSCRIBE_TOPICS
        .iter()
        .copied()
        .filter(|pattern| pattern.contains(DEVICE_NUMBER_SEGMENT) && *pattern != "{device_number}/down")
}

static NORMALIZED_DOWN_PATTERNS: LazyLock<Vec<TopicPattern>> = LazyLock::new(|| {
    normalized_down_topics()
        .filter_map(|template| TopicPattern::compile(template, CompileMode::Extract).ok())
        .collect()
});

/// 若主题属于规范下行主题，提取其中的设备编号。
pub fn extract_device_number(topic: &str) -> Option<String> {
    NORMALIZED_DOWN_PATTERNS
        .iter()
        .filter_map(|pattern| pattern.capture(topic))
        .find(|device_number| !device_number.is_empty())
}
