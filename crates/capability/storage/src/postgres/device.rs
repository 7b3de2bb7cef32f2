//! Postgres 设备存储实现
//!
//! 只读取主题层需要的列（id、device_number、voucher、device_config_id）。

use crate::error::StorageError;
use crate::traits::DeviceStore;
use domain::DeviceRecord;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const DEVICE_COLUMNS: &str =
    "id::text as id, device_number, voucher, device_config_id::text as device_config_id";

pub struct PgDeviceStore {
    pub pool: PgPool,
}

impl PgDeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<DeviceRecord>, StorageError> {
        let sql = format!("select {DEVICE_COLUMNS} from devices where {column} = $1 limit 1");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(device_from_row).transpose()
    }
}

fn device_from_row(row: PgRow) -> Result<DeviceRecord, StorageError> {
    Ok(DeviceRecord {
        id: row.try_get("id")?,
        device_number: row.try_get("device_number")?,
        voucher: row.try_get("voucher")?,
        device_config_id: row.try_get("device_config_id")?,
    })
}

#[async_trait::async_trait]
impl DeviceStore for PgDeviceStore {
    async fn find_by_voucher(&self, voucher: &str) -> Result<Option<DeviceRecord>, StorageError> {
        self.find_one("voucher", voucher).await
    }

    async fn find_by_id(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError> {
        self.find_one("id::text", device_id).await
    }

    async fn find_by_number(
        &self,
        device_number: &str,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        self.find_one("device_number", device_number).await
    }
}
