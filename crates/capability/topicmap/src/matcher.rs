//! 主题模板编译、变量提取与渲染。
//!
//! 模板语法：
//! - `+`：单层通配（不捕获）
//! - `{name}`：命名变量，匹配时按单层通配处理
//! - `#`：不支持，含 `#` 的模板永远不匹配
//!
//! 编译结果整体锚定（`^...$`），不会做前缀匹配。

use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// 唯一可被提取的变量名。
pub const DEVICE_NUMBER_VAR: &str = "device_number";

const SINGLE_LEVEL: &str = "[^/]+";
const SINGLE_LEVEL_CAPTURE: &str = "([^/]+)";
const PATTERN_CACHE_CAPACITY: usize = 4096;

/// 编译模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileMode {
    /// 所有变量按非捕获单层通配处理
    Match,
    /// `{device_number}` 按捕获单层通配处理
    Extract,
}

/// 模板不可用（规则会被跳过，不影响其他规则）。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("empty template")]
    Empty,
    #[error("multi-level wildcard is not allowed: {0}")]
    MultiLevelWildcard(String),
    #[error("invalid template {template}: {reason}")]
    Invalid { template: String, reason: String },
}

enum Token<'a> {
    Literal(&'a str),
    Wildcard,
    Variable(&'a str),
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// 把模板切分为字面量、`+` 与 `{name}`；不合法的花括号按字面量处理。
fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut index = 0;
    let bytes = template.as_bytes();
    while index < bytes.len() {
        match bytes[index] {
            b'+' => {
                if literal_start < index {
                    tokens.push(Token::Literal(&template[literal_start..index]));
                }
                tokens.push(Token::Wildcard);
                index += 1;
                literal_start = index;
            }
            b'{' => {
                let close = template[index + 1..].find('}').map(|pos| index + 1 + pos);
                match close {
                    Some(close) if is_variable_name(&template[index + 1..close]) => {
                        if literal_start < index {
                            tokens.push(Token::Literal(&template[literal_start..index]));
                        }
                        tokens.push(Token::Variable(&template[index + 1..close]));
                        index = close + 1;
                        literal_start = index;
                    }
                    _ => index += 1,
                }
            }
            _ => index += 1,
        }
    }
    if literal_start < bytes.len() {
        tokens.push(Token::Literal(&template[literal_start..]));
    }
    tokens
}

/// 编译后的主题匹配器。
#[derive(Debug, Clone)]
pub struct TopicPattern {
    template: String,
    regex: Regex,
}

impl TopicPattern {
    /// 编译模板；失败不会 panic，而是返回 `TemplateError`。
    pub fn compile(template: &str, mode: CompileMode) -> Result<Self, TemplateError> {
        if template.is_empty() {
            return Err(TemplateError::Empty);
        }
        if template.contains('#') {
            return Err(TemplateError::MultiLevelWildcard(template.to_string()));
        }
        let mut pattern = String::with_capacity(template.len() * 2 + 2);
        pattern.push('^');
        for token in tokenize(template) {
            match token {
                Token::Literal(text) => pattern.push_str(&regex::escape(text)),
                Token::Wildcard => pattern.push_str(SINGLE_LEVEL),
                Token::Variable(name) if mode == CompileMode::Extract && name == DEVICE_NUMBER_VAR => {
                    pattern.push_str(SINGLE_LEVEL_CAPTURE)
                }
                Token::Variable(_) => pattern.push_str(SINGLE_LEVEL),
            }
        }
        pattern.push('$');
        let regex = Regex::new(&pattern).map_err(|err| TemplateError::Invalid {
            template: template.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            template: template.to_string(),
            regex,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn is_match(&self, topic: &str) -> bool {
        self.regex.is_match(topic)
    }

    /// 匹配成功时返回第一个捕获组（没有捕获组时为空字符串）。
    pub fn capture(&self, topic: &str) -> Option<String> {
        let captures = self.regex.captures(topic)?;
        Some(
            captures
                .get(1)
                .map(|value| value.as_str().to_string())
                .unwrap_or_default(),
        )
    }
}

/// 模板是否匹配主题；模板不可用时视为不匹配。
pub fn matches(template: &str, topic: &str) -> bool {
    TopicPattern::compile(template, CompileMode::Match)
        .map(|pattern| pattern.is_match(topic))
        .unwrap_or(false)
}

/// 以提取模式匹配并返回 `device_number` 的值；不匹配返回 None。
pub fn extract(template: &str, topic: &str) -> Option<String> {
    TopicPattern::compile(template, CompileMode::Extract)
        .ok()?
        .capture(topic)
}

/// 文本替换 `{name}` 占位符；未提供的变量保留原样。
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    for token in tokenize(template) {
        match token {
            Token::Literal(text) => rendered.push_str(text),
            Token::Wildcard => rendered.push('+'),
            Token::Variable(name) => match vars.iter().find(|(key, _)| *key == name) {
                Some((_, value)) => rendered.push_str(value),
                None => {
                    rendered.push('{');
                    rendered.push_str(name);
                    rendered.push('}');
                }
            },
        }
    }
    rendered
}

/// 主题是否仍含通配符（无法作为具体发布主题）。
pub fn has_wildcard(topic: &str) -> bool {
    topic.contains('+') || topic.contains('#')
}

/// 已编译模板的进程内缓存，避免每次查找都重新编译正则。
///
/// 编译失败的结果同样缓存，匹配语义与直接编译一致。
#[derive(Default)]
pub struct PatternCache {
    entries: RwLock<HashMap<(String, CompileMode), Result<Arc<TopicPattern>, TemplateError>>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(
        &self,
        template: &str,
        mode: CompileMode,
    ) -> Result<Arc<TopicPattern>, TemplateError> {
        let key = (template.to_string(), mode);
        if let Ok(entries) = self.entries.read() {
            if let Some(compiled) = entries.get(&key) {
                return compiled.clone();
            }
        }
        let compiled = TopicPattern::compile(template, mode).map(Arc::new);
        if let Ok(mut entries) = self.entries.write() {
            if entries.len() >= PATTERN_CACHE_CAPACITY {
                entries.clear();
            }
            entries.insert(key, compiled.clone());
        }
        compiled
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_matches_exactly_one_level() {
        let pattern = TopicPattern::compile("a/+/c", CompileMode::Match).expect("compile");
        assert!(pattern.is_match("a/x/c"));
        assert!(!pattern.is_match("a/x/y/c"));
        assert!(!pattern.is_match("a/c"));
        assert!(!pattern.is_match("a//c"));
    }

    #[test]
    fn match_is_anchored() {
        assert!(!matches("a/+", "prefix/a/b"));
        assert!(!matches("a/+", "a/b/suffix"));
    }

    #[test]
    fn hash_is_never_usable() {
        assert_eq!(
            TopicPattern::compile("a/#", CompileMode::Match).err(),
            Some(TemplateError::MultiLevelWildcard("a/#".to_string()))
        );
        for topic in ["a/#", "a/b", "a/b/c", "", "#"] {
            assert!(!matches("a/#", topic));
            assert!(!matches("#", topic));
        }
    }

    #[test]
    fn empty_template_matches_nothing() {
        assert_eq!(
            TopicPattern::compile("", CompileMode::Match).err(),
            Some(TemplateError::Empty)
        );
        assert!(!matches("", ""));
    }

    #[test]
    fn literal_text_is_escaped() {
        assert!(matches("v1.0/{device_number}", "v1.0/D1"));
        assert!(!matches("v1.0/{device_number}", "v1x0/D1"));
        assert!(matches("a/(b)/+", "a/(b)/c"));
    }

    #[test]
    fn extract_device_number() {
        assert_eq!(
            extract("devices/command/{device_number}/+", "devices/command/D1/set"),
            Some("D1".to_string())
        );
        assert_eq!(extract("devices/command/{device_number}/+", "devices/command/D1"), None);
        // 其他变量只参与匹配，不被捕获
        assert_eq!(extract("x/{message_id}/y", "x/42/y"), Some(String::new()));
    }

    #[test]
    fn render_substitutes_known_variables_only() {
        assert_eq!(
            render("{device_number}/cmd/{device_number}/{other}", &[(DEVICE_NUMBER_VAR, "D1")]),
            "D1/cmd/D1/{other}"
        );
        assert_eq!(render("a/+/{device_number}", &[(DEVICE_NUMBER_VAR, "D1")]), "a/+/D1");
        assert!(has_wildcard(&render("a/+/{device_number}", &[])));
    }

    #[test]
    fn malformed_braces_are_literals() {
        assert!(matches("a/{bad-name}/+", "a/{bad-name}/x"));
        assert!(matches("a/{/b", "a/{/b"));
        assert_eq!(render("a/{}/b", &[]), "a/{}/b");
    }

    #[test]
    fn pattern_cache_reuses_compiled_patterns() {
        let cache = PatternCache::new();
        let first = cache.get_or_compile("a/+", CompileMode::Match).expect("compile");
        let second = cache.get_or_compile("a/+", CompileMode::Match).expect("compile");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.get_or_compile("a/#", CompileMode::Match).is_err());
        assert_eq!(cache.len(), 2);
    }
}
