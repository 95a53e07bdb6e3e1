//! Product database operations

use shared::comparison::ProductRef;
use shared::models::{Product, ProductCreate, ProductUpdate, StockAddition, StockHistoryEntry};
use shared::util::snowflake_id;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use super::BoxError;

const PRODUCT_COLUMNS: &str =
    "id, title, description, category, price, sizes, images, is_active, created_at, updated_at";

/// Storefront/admin list filter
#[derive(Debug, Default)]
pub struct ProductFilter<'a> {
    pub category: Option<&'a str>,
    /// Case-insensitive match on title or description
    pub search: Option<&'a str>,
    pub active_only: bool,
}

pub async fn list_products(
    pool: &PgPool,
    filter: &ProductFilter<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Product>, BoxError> {
    let pattern = filter.search.map(|s| format!("%{}%", s.trim()));
    let rows = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products
        WHERE ($1::text IS NULL OR category = $1)
          AND ($2::text IS NULL OR title ILIKE $2 OR description ILIKE $2)
          AND (NOT $3 OR is_active)
        ORDER BY created_at DESC, id DESC
        LIMIT $4 OFFSET $5
        "#
    ))
    .bind(filter.category)
    .bind(pattern)
    .bind(filter.active_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<Product>, BoxError> {
    let row = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_products_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<Product>, BoxError> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Which of `ids` exist
pub async fn existing_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<i64>, BoxError> {
    let rows: Vec<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Lock products for a stock change inside `tx`
pub async fn lock_products(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[i64],
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE"
    ))
    .bind(ids)
    .fetch_all(&mut **tx)
    .await
}

/// Overwrite the per-size stock of a locked product
pub async fn write_sizes(
    tx: &mut Transaction<'_, Postgres>,
    product: &Product,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET sizes = $2, updated_at = $3 WHERE id = $1")
        .bind(product.id)
        .bind(Json(&product.sizes))
        .bind(now)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<String>, BoxError> {
    let rows: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT category FROM products WHERE is_active ORDER BY category",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Every product as (id, title), oldest first
pub async fn list_product_refs(pool: &PgPool) -> Result<Vec<ProductRef>, BoxError> {
    let rows = sqlx::query_as::<_, ProductRef>(
        "SELECT id, title FROM products ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count_products(pool: &PgPool) -> Result<i64, BoxError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Insert a product; non-empty initial sizes are recorded as the first stock entry
pub async fn create_product(pool: &PgPool, data: &ProductCreate, now: i64) -> Result<Product, BoxError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, Product>(&format!(
        r#"
        INSERT INTO products (id, title, description, category, price, sizes, images, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(data.title.trim())
    .bind(&data.description)
    .bind(data.category.trim())
    .bind(data.price)
    .bind(Json(&data.sizes))
    .bind(&data.images)
    .bind(data.is_active.unwrap_or(true))
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    if data.sizes.values().any(|qty| *qty > 0) {
        sqlx::query(
            r#"
            INSERT INTO stock_history (id, product_id, added_by_size, note, created_at)
            VALUES ($1, $2, $3, 'Initial stock', $4)
            "#,
        )
        .bind(snowflake_id())
        .bind(row.id)
        .bind(Json(&data.sizes))
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(row)
}

/// Partial update. Setting `sizes` also flags the product as edited.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    data: &ProductUpdate,
    now: i64,
) -> Result<Option<Product>, BoxError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            category = COALESCE($4, category),
            price = COALESCE($5, price),
            sizes = COALESCE($6, sizes),
            images = COALESCE($7, images),
            is_active = COALESCE($8, is_active),
            updated_at = $9
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(data.title.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(data.category.as_deref().map(str::trim))
    .bind(data.price)
    .bind(data.sizes.as_ref().map(Json))
    .bind(&data.images)
    .bind(data.is_active)
    .bind(now)
    .fetch_optional(&mut *tx)
    .await?;

    if row.is_some() && data.sizes.is_some() {
        sqlx::query(
            r#"
            INSERT INTO edited_products (product_id, edited_at) VALUES ($1, $2)
            ON CONFLICT (product_id) DO UPDATE SET edited_at = EXCLUDED.edited_at
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(row)
}

pub async fn delete_product(pool: &PgPool, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Increment stock per size and append the matching history entry
pub async fn add_stock(
    pool: &PgPool,
    id: i64,
    addition: &StockAddition,
    now: i64,
) -> Result<Option<(Product, StockHistoryEntry)>, BoxError> {
    let mut tx = pool.begin().await?;

    let Some(mut product) = lock_products(&mut tx, &[id]).await?.into_iter().next() else {
        return Ok(None);
    };

    for (size, qty) in &addition.sizes {
        *product.sizes.entry(size.clone()).or_insert(0) += qty;
    }
    product.updated_at = now;
    write_sizes(&mut tx, &product, now).await?;

    let entry = sqlx::query_as::<_, StockHistoryEntry>(
        r#"
        INSERT INTO stock_history (id, product_id, added_by_size, note, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, product_id, added_by_size, note, created_at
        "#,
    )
    .bind(snowflake_id())
    .bind(id)
    .bind(Json(&addition.sizes))
    .bind(&addition.note)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some((product, entry)))
}
