//! 键值缓存内存实现（用于测试与占位）。
//!
//! 语义对齐 Redis：字符串与列表分型，过期键视为不存在，
//! 对列表键执行 GET 返回 WRONGTYPE 错误。

use crate::error::StorageError;
use crate::traits::KvStore;
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Clone)]
enum Value {
    Str(String),
    List(VecDeque<String>),
}

#[derive(Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

pub struct InMemoryKvStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// 当前未过期的键数量。
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .map(|map| map.values().filter(|entry| !entry.is_expired(now)).count())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 过期时刻；溢出视为不过期。
fn deadline(now: Instant, ttl_seconds: u64) -> Option<Instant> {
    if ttl_seconds == 0 {
        return None;
    }
    now.checked_add(Duration::from_secs(ttl_seconds))
}

fn wrong_type() -> StorageError {
    StorageError::new("WRONGTYPE Operation against a key holding the wrong kind of value")
}

#[async_trait::async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self
            .entries
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        match map.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => match &entry.value {
                Value::Str(value) => Ok(Some(value.clone())),
                Value::List(_) => Err(wrong_type()),
            },
            _ => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<(), StorageError> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let expires_at = ttl_seconds.and_then(|ttl| deadline(Instant::now(), ttl));
        map.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        for key in keys {
            map.remove(key);
        }
        Ok(())
    }

    async fn push_capped(
        &self,
        key: &str,
        value: &str,
        max_items: usize,
        ttl_seconds: Option<u64>,
    ) -> Result<(), StorageError> {
        let now = Instant::now();
        let mut map = self
            .entries
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if map.get(key).is_some_and(|entry| entry.is_expired(now)) {
            map.remove(key);
        }
        let entry = map.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::List(VecDeque::new()),
            expires_at: None,
        });
        let Value::List(items) = &mut entry.value else {
            return Err(wrong_type());
        };
        items.push_front(value.to_string());
        items.truncate(max_items.max(1));
        if let Some(ttl) = ttl_seconds.filter(|ttl| *ttl > 0) {
            entry.expires_at = deadline(now, ttl);
        }
        Ok(())
    }

    async fn list(&self, key: &str) -> Result<Vec<String>, StorageError> {
        let map = self
            .entries
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        match map.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => match &entry.value {
                Value::List(items) => Ok(items.iter().cloned().collect()),
                Value::Str(_) => Err(wrong_type()),
            },
            _ => Ok(Vec::new()),
        }
    }

    async fn ttl_seconds(&self, key: &str) -> Result<Option<u64>, StorageError> {
        let now = Instant::now();
        let map = self
            .entries
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .and_then(|entry| entry.expires_at)
            .map(|deadline| deadline.saturating_duration_since(now).as_secs()))
    }
}
