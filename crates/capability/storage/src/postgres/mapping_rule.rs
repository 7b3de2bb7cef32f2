//! Postgres 映射规则存储实现

use crate::error::StorageError;
use crate::traits::MappingRuleStore;
use chrono::{DateTime, Utc};
use domain::{Direction, MappingRule};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgMappingRuleStore {
    pub pool: PgPool,
}

impl PgMappingRuleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn rule_from_row(row: PgRow) -> Result<MappingRule, StorageError> {
    let direction: String = row.try_get("direction")?;
    let direction = direction
        .parse::<Direction>()
        .map_err(|err| StorageError::new(err.to_string()))?;
    Ok(MappingRule {
        id: row.try_get("id")?,
        device_config_id: row.try_get("device_config_id")?,
        name: row.try_get("name")?,
        direction,
        source_topic: row.try_get("source_topic")?,
        target_topic: row.try_get("target_topic")?,
        data_identifier: row.try_get("data_identifier")?,
        priority: row.try_get("priority")?,
        enabled: row.try_get("enabled")?,
        description: row.try_get("description")?,
        created_at: row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
        updated_at: row.try_get::<Option<DateTime<Utc>>, _>("updated_at")?,
    })
}

#[async_trait::async_trait]
impl MappingRuleStore for PgMappingRuleStore {
    async fn list_enabled(
        &self,
        device_config_id: &str,
        direction: Direction,
    ) -> Result<Vec<MappingRule>, StorageError> {
        let rows = sqlx::query(
            "select id, device_config_id::text as device_config_id, name, direction, source_topic, target_topic, \
             data_identifier, priority, enabled, description, created_at, updated_at \
             from device_topic_mappings \
             where device_config_id::text = $1 and direction = $2 and enabled = true",
        )
        .bind(device_config_id)
        .bind(direction.as_str())
        .fetch_all(&self.pool)
        .await?;
        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            rules.push(rule_from_row(row)?);
        }
        Ok(rules)
    }
}
