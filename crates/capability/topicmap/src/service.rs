//! 映射服务：上行目标解析、自定义下行订阅鉴权、下行源主题解析。

use crate::cache::MappingCache;
use crate::error::TopicMapError;
use crate::matcher::{CompileMode, DEVICE_NUMBER_VAR, PatternCache, TopicPattern, has_wildcard, render};
use domain::{Direction, MappingRule};
use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;
use std::sync::Arc;
use tracing::debug;

const EMPTY_OBJECT: &[u8] = b"{}";

/// 下行解析结果：设备侧具体主题与（可能收窄后的）载荷。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownRoute {
    pub source_topic: String,
    pub payload: Vec<u8>,
    pub rule_id: i64,
    /// 是否按 data_identifier 命中（否则为兜底规则）
    pub identifier_matched: bool,
}

/// 平台下发载荷：`{"method": ..., "params": ...}`。
#[derive(Deserialize)]
struct MethodEnvelope<'a> {
    #[serde(default)]
    method: String,
    /// 字段缺失为 None；显式 `null` 保留为原文
    #[serde(borrow, default, deserialize_with = "present_raw")]
    params: Option<&'a RawValue>,
}

fn present_raw<'de, D>(deserializer: D) -> Result<Option<&'de RawValue>, D::Error>
where
    D: Deserializer<'de>,
{
    <&RawValue>::deserialize(deserializer).map(Some)
}

#[derive(Clone)]
pub struct MappingService {
    cache: MappingCache,
    patterns: Arc<PatternCache>,
}

impl MappingService {
    pub fn new(cache: MappingCache) -> Self {
        Self {
            cache,
            patterns: Arc::new(PatternCache::new()),
        }
    }

    pub fn cache(&self) -> &MappingCache {
        &self.cache
    }

    fn compiled(&self, rule: &MappingRule, template: &str) -> Option<Arc<TopicPattern>> {
        match self.patterns.get_or_compile(template, CompileMode::Match) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                debug!(target: "tg.topicmap", rule_id = rule.id, error = %err, "mapping_rule_skipped");
                None
            }
        }
    }

    /// 按优先级找到第一条源模板匹配的上行规则，返回渲染后的目标主题。
    ///
    /// 目标模板渲染时不代入源主题中提取的变量。
    pub async fn resolve_up_target(
        &self,
        device_config_id: &str,
        topic: &str,
    ) -> Result<Option<String>, TopicMapError> {
        let rules = self.cache.get(device_config_id, Direction::Up).await?;
        for rule in &rules {
            let Some(pattern) = self.compiled(rule, &rule.source_topic) else {
                continue;
            };
            if pattern.is_match(topic) {
                return Ok(Some(render(&rule.target_topic, &[])));
            }
        }
        Ok(None)
    }

    /// 订阅主题命中任意下行规则的源模板即放行。
    pub async fn allow_down_subscribe(
        &self,
        device_config_id: &str,
        topic: &str,
    ) -> Result<bool, TopicMapError> {
        let rules = self.cache.get(device_config_id, Direction::Down).await?;
        Ok(rules.iter().any(|rule| {
            self.compiled(rule, &rule.source_topic)
                .is_some_and(|pattern| pattern.is_match(topic))
        }))
    }

    /// 把规范下行主题解析为设备侧具体主题。
    ///
    /// 带 data_identifier 的规则按载荷 `method` 精确匹配，第一条命中即返回 `params`；
    /// 没有任何标识规则命中时，使用第一条不带标识且能渲染出具体主题的规则，载荷原样转发。
    pub async fn resolve_down_source(
        &self,
        device_config_id: &str,
        normalized_topic: &str,
        device_number: &str,
        payload: &[u8],
    ) -> Result<Option<DownRoute>, TopicMapError> {
        let rules = self.cache.get(device_config_id, Direction::Down).await?;
        let mut fallback: Option<DownRoute> = None;
        let mut envelope: Option<Option<MethodEnvelope<'_>>> = None;

        for rule in &rules {
            let Some(pattern) = self.compiled(rule, &rule.target_topic) else {
                continue;
            };
            if !pattern.is_match(normalized_topic) {
                continue;
            }
            let source_topic = render(&rule.source_topic, &[(DEVICE_NUMBER_VAR, device_number)]);
            if has_wildcard(&source_topic) {
                debug!(
                    target: "tg.topicmap",
                    rule_id = rule.id,
                    source_topic = %source_topic,
                    "mapping_rule_not_concrete"
                );
                continue;
            }

            let Some(identifier) = rule.identifier() else {
                if fallback.is_none() {
                    fallback = Some(DownRoute {
                        source_topic,
                        payload: payload.to_vec(),
                        rule_id: rule.id,
                        identifier_matched: false,
                    });
                }
                continue;
            };

            let parsed = envelope.get_or_insert_with(|| match serde_json::from_slice(payload) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    debug!(target: "tg.topicmap", error = %err, "down_payload_not_method_envelope");
                    None
                }
            });
            let Some(parsed) = parsed.as_ref() else {
                continue;
            };
            if parsed.method != identifier {
                continue;
            }
            let out = match parsed.params {
                Some(params) => params.get().as_bytes().to_vec(),
                None => EMPTY_OBJECT.to_vec(),
            };
            return Ok(Some(DownRoute {
                source_topic,
                payload: out,
                rule_id: rule.id,
                identifier_matched: true,
            }));
        }

        Ok(fallback)
    }
}
