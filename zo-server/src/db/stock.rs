//! Stock history, edited markers and reconciliation inputs

use shared::models::{OrderLine, ReferenceDate, StockHistoryEntry};
use sqlx::PgPool;
use std::collections::HashSet;

use super::BoxError;
use super::orders::parse_status;
use super::settings::{STOCK_REFERENCE_DATE, get_setting, set_setting};

/// History entries created at or after `since`
pub async fn list_history(pool: &PgPool, since: Option<i64>) -> Result<Vec<StockHistoryEntry>, BoxError> {
    let rows = sqlx::query_as::<_, StockHistoryEntry>(
        r#"
        SELECT id, product_id, added_by_size, note, created_at
        FROM stock_history
        WHERE $1::bigint IS NULL OR created_at >= $1
        ORDER BY created_at
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_product_history(pool: &PgPool, product_id: i64) -> Result<Vec<StockHistoryEntry>, BoxError> {
    let rows = sqlx::query_as::<_, StockHistoryEntry>(
        r#"
        SELECT id, product_id, added_by_size, note, created_at
        FROM stock_history
        WHERE product_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    product_id: i64,
    size: String,
    quantity: i64,
    status: String,
}

/// Order lines of orders placed at or after `since`, any status
pub async fn list_order_lines(pool: &PgPool, since: Option<i64>) -> Result<Vec<OrderLine>, BoxError> {
    let rows = sqlx::query_as::<_, OrderLineRow>(
        r#"
        SELECT i.product_id, i.size, i.quantity, o.status
        FROM order_items i
        JOIN orders o ON o.id = i.order_id
        WHERE $1::bigint IS NULL OR o.created_at >= $1
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| -> Result<OrderLine, BoxError> {
            Ok(OrderLine {
                product_id: r.product_id,
                size: r.size,
                quantity: r.quantity,
                status: parse_status(&r.status)?,
            })
        })
        .collect()
}

pub async fn edited_product_ids(pool: &PgPool) -> Result<HashSet<i64>, BoxError> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT product_id FROM edited_products")
        .fetch_all(pool)
        .await?;
    Ok(ids.into_iter().collect())
}

pub async fn clear_edited(pool: &PgPool, product_id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM edited_products WHERE product_id = $1")
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_reference_date(pool: &PgPool) -> Result<ReferenceDate, BoxError> {
    Ok(get_setting(pool, STOCK_REFERENCE_DATE).await?.unwrap_or_default())
}

pub async fn set_reference_date(pool: &PgPool, value: ReferenceDate, now: i64) -> Result<(), BoxError> {
    set_setting(pool, STOCK_REFERENCE_DATE, &value, now).await
}
