//! Client database operations

use shared::models::ClientSummary;
use sqlx::PgPool;

use super::BoxError;

const SUMMARY_SELECT: &str = r#"
    SELECT c.id, c.name, c.phone, c.email, c.address, c.created_at,
           COUNT(o.id) AS order_count,
           COALESCE(SUM(o.total_amount) FILTER (WHERE o.status <> 'cancelled'), 0)::BIGINT AS lifetime_spend
    FROM clients c
    LEFT JOIN orders o ON o.client_id = c.id
"#;

pub async fn list_clients(
    pool: &PgPool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ClientSummary>, BoxError> {
    let pattern = search.map(|s| format!("%{}%", s.trim()));
    let rows = sqlx::query_as::<_, ClientSummary>(&format!(
        r#"
        {SUMMARY_SELECT}
        WHERE $1::text IS NULL OR c.name ILIKE $1 OR c.phone ILIKE $1
        GROUP BY c.id
        ORDER BY c.created_at DESC, c.id DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_client_summary(pool: &PgPool, id: i64) -> Result<Option<ClientSummary>, BoxError> {
    let row = sqlx::query_as::<_, ClientSummary>(&format!(
        "{SUMMARY_SELECT} WHERE c.id = $1 GROUP BY c.id"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn delete_client(pool: &PgPool, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM clients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
