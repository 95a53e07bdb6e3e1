//! Favorite database operations

use shared::models::Product;
use sqlx::PgPool;

use super::BoxError;

/// Favorite products of a client, most recently added first
pub async fn list_favorite_products(pool: &PgPool, phone: &str) -> Result<Vec<Product>, BoxError> {
    let rows = sqlx::query_as::<_, Product>(
        r#"
        SELECT p.id, p.title, p.description, p.category, p.price, p.sizes, p.images,
               p.is_active, p.created_at, p.updated_at
        FROM favorites f
        JOIN products p ON p.id = f.product_id
        WHERE f.client_phone = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(phone)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Idempotent
pub async fn add_favorite(pool: &PgPool, phone: &str, product_id: i64, now: i64) -> Result<(), BoxError> {
    sqlx::query(
        r#"
        INSERT INTO favorites (client_phone, product_id, created_at) VALUES ($1, $2, $3)
        ON CONFLICT (client_phone, product_id) DO NOTHING
        "#,
    )
    .bind(phone)
    .bind(product_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Idempotent; returns whether a row was removed
pub async fn remove_favorite(pool: &PgPool, phone: &str, product_id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM favorites WHERE client_phone = $1 AND product_id = $2")
        .bind(phone)
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
