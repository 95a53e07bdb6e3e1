//! Key/value settings

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::PgPool;

use super::BoxError;

pub const STOCK_REFERENCE_DATE: &str = "stock_reference_date";

pub async fn get_setting<T: DeserializeOwned>(pool: &PgPool, key: &str) -> Result<Option<T>, BoxError> {
    let value: Option<serde_json::Value> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    match value {
        Some(v) => Ok(Some(serde_json::from_value(v)?)),
        None => Ok(None),
    }
}

pub async fn set_setting<T: Serialize>(pool: &PgPool, key: &str, value: &T, now: i64) -> Result<(), BoxError> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at) VALUES ($1, $2, $3)
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(key)
    .bind(serde_json::to_value(value)?)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
