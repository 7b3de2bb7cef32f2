//! 数据库连接管理
//!
//! - connect_pool：建立 Postgres 连接池
//! - connect_redis：打开 Redis 客户端

use crate::error::StorageError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// 建立 Postgres 连接池
///
/// # 参数
/// - `database_url`：Postgres 连接字符串
/// - `max_connections`：连接池上限（Hook 并发较高时适当调大）
pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<PgPool, StorageError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// 打开 Redis 客户端（惰性连接，首次命令时建连）。
pub fn connect_redis(redis_url: &str) -> Result<redis::Client, StorageError> {
    Ok(redis::Client::open(redis_url)?)
}
