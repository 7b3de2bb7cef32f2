//! Redis 键值缓存实现

use crate::error::StorageError;
use crate::traits::KvStore;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

/// Redis 键值缓存
pub struct RedisKvStore {
    client: redis::Client,
}

impl RedisKvStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    pub fn connect(redis_url: &str) -> Result<Self, StorageError> {
        Ok(Self::new(crate::connection::connect_redis(redis_url)?))
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StorageError> {
        Ok(self.client.get_multiplexed_tokio_connection().await?)
    }
}

#[async_trait::async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut connection = self.connection().await?;
        let value: Option<String> = connection.get(key).await?;
        Ok(value)
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<(), StorageError> {
        let mut connection = self.connection().await?;
        match ttl_seconds {
            Some(ttl) if ttl > 0 => connection.set_ex::<_, _, ()>(key, value, ttl).await?,
            _ => connection.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut connection = self.connection().await?;
        connection.del::<_, ()>(keys.to_vec()).await?;
        Ok(())
    }

    async fn push_capped(
        &self,
        key: &str,
        value: &str,
        max_items: usize,
        ttl_seconds: Option<u64>,
    ) -> Result<(), StorageError> {
        let mut connection = self.connection().await?;
        let last_index = max_items.max(1) as isize - 1;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("LPUSH")
            .arg(key)
            .arg(value)
            .ignore()
            .cmd("LTRIM")
            .arg(key)
            .arg(0)
            .arg(last_index)
            .ignore();
        if let Some(ttl) = ttl_seconds.filter(|ttl| *ttl > 0) {
            pipe.cmd("EXPIRE").arg(key).arg(ttl).ignore();
        }
        let _: () = pipe.query_async(&mut connection).await?;
        Ok(())
    }

    async fn list(&self, key: &str) -> Result<Vec<String>, StorageError> {
        let mut connection = self.connection().await?;
        let items: Vec<String> = connection.lrange(key, 0, -1).await?;
        Ok(items)
    }

    async fn ttl_seconds(&self, key: &str) -> Result<Option<u64>, StorageError> {
        let mut connection = self.connection().await?;
        // -2：键不存在；-1：无过期时间
        let ttl: i64 = redis::cmd("TTL").arg(key).query_async(&mut connection).await?;
        Ok(u64::try_from(ttl).ok())
    }
}
