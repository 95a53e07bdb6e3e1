//! Flash sale database operations

use shared::models::{FlashSale, FlashSaleCreate, FlashSaleProduct, FlashSaleUpdate};
use shared::util::snowflake_id;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;

use super::BoxError;

const SALE_COLUMNS: &str =
    "id, title, description, global_discount_percentage, start_date, end_date, is_active, created_at";

#[derive(sqlx::FromRow)]
struct FlashSaleRow {
    id: i64,
    title: String,
    description: Option<String>,
    global_discount_percentage: f64,
    start_date: i64,
    end_date: i64,
    is_active: bool,
    created_at: i64,
}

impl FlashSaleRow {
    fn into_model(self, products: Vec<FlashSaleProduct>) -> FlashSale {
        FlashSale {
            id: self.id,
            title: self.title,
            description: self.description,
            global_discount_percentage: self.global_discount_percentage,
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: self.is_active,
            products,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SaleProductRow {
    flash_sale_id: i64,
    product_id: i64,
    discount_percentage: Option<f64>,
}

/// Load product entries for the given sale rows
async fn attach_products(pool: &PgPool, rows: Vec<FlashSaleRow>) -> Result<Vec<FlashSale>, BoxError> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let entries = sqlx::query_as::<_, SaleProductRow>(
        r#"
        SELECT flash_sale_id, product_id, discount_percentage
        FROM flash_sale_products
        WHERE flash_sale_id = ANY($1)
        ORDER BY product_id
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_sale: HashMap<i64, Vec<FlashSaleProduct>> = HashMap::new();
    for e in entries {
        by_sale.entry(e.flash_sale_id).or_default().push(FlashSaleProduct {
            product_id: e.product_id,
            discount_percentage: e.discount_percentage,
        });
    }

    Ok(rows
        .into_iter()
        .map(|r| {
            let products = by_sale.remove(&r.id).unwrap_or_default();
            r.into_model(products)
        })
        .collect())
}

pub async fn list_flash_sales(pool: &PgPool) -> Result<Vec<FlashSale>, BoxError> {
    let rows = sqlx::query_as::<_, FlashSaleRow>(&format!(
        "SELECT {SALE_COLUMNS} FROM flash_sales ORDER BY start_date DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;
    attach_products(pool, rows).await
}

/// Sales enabled and running at `now` (window inclusive on both ends)
pub async fn list_active(pool: &PgPool, now: i64) -> Result<Vec<FlashSale>, BoxError> {
    let rows = sqlx::query_as::<_, FlashSaleRow>(&format!(
        r#"
        SELECT {SALE_COLUMNS}
        FROM flash_sales
        WHERE is_active AND start_date <= $1 AND end_date >= $1
        ORDER BY end_date, id
        "#
    ))
    .bind(now)
    .fetch_all(pool)
    .await?;
    attach_products(pool, rows).await
}

pub async fn get_flash_sale(pool: &PgPool, id: i64) -> Result<Option<FlashSale>, BoxError> {
    let row = sqlx::query_as::<_, FlashSaleRow>(&format!(
        "SELECT {SALE_COLUMNS} FROM flash_sales WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(r) => Ok(attach_products(pool, vec![r]).await?.pop()),
        None => Ok(None),
    }
}

async fn replace_products(
    tx: &mut Transaction<'_, Postgres>,
    sale_id: i64,
    products: &[FlashSaleProduct],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM flash_sale_products WHERE flash_sale_id = $1")
        .bind(sale_id)
        .execute(&mut **tx)
        .await?;

    if products.is_empty() {
        return Ok(());
    }

    let sale_ids: Vec<i64> = products.iter().map(|_| sale_id).collect();
    let product_ids: Vec<i64> = products.iter().map(|p| p.product_id).collect();
    let discounts: Vec<Option<f64>> = products.iter().map(|p| p.discount_percentage).collect();
    sqlx::query(
        r#"
        INSERT INTO flash_sale_products (flash_sale_id, product_id, discount_percentage)
        SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::double precision[])
        ON CONFLICT (flash_sale_id, product_id) DO UPDATE SET discount_percentage = EXCLUDED.discount_percentage
        "#,
    )
    .bind(&sale_ids)
    .bind(&product_ids)
    .bind(&discounts)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn create_flash_sale(pool: &PgPool, data: &FlashSaleCreate, now: i64) -> Result<FlashSale, BoxError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, FlashSaleRow>(&format!(
        r#"
        INSERT INTO flash_sales (id, title, description, global_discount_percentage, start_date, end_date, is_active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {SALE_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(data.title.trim())
    .bind(&data.description)
    .bind(data.global_discount_percentage)
    .bind(data.start_date)
    .bind(data.end_date)
    .bind(data.is_active.unwrap_or(true))
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    replace_products(&mut tx, row.id, &data.products).await?;
    tx.commit().await?;

    Ok(row.into_model(data.products.clone()))
}

pub async fn update_flash_sale(
    pool: &PgPool,
    id: i64,
    data: &FlashSaleUpdate,
) -> Result<Option<FlashSale>, BoxError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, FlashSaleRow>(&format!(
        r#"
        UPDATE flash_sales SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            global_discount_percentage = COALESCE($4, global_discount_percentage),
            start_date = COALESCE($5, start_date),
            end_date = COALESCE($6, end_date),
            is_active = COALESCE($7, is_active)
        WHERE id = $1
        RETURNING {SALE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(data.title.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(data.global_discount_percentage)
    .bind(data.start_date)
    .bind(data.end_date)
    .bind(data.is_active)
    .fetch_optional(&mut *tx)
    .await?;

    if row.is_none() {
        return Ok(None);
    }
    if let Some(products) = &data.products {
        replace_products(&mut tx, id, products).await?;
    }
    tx.commit().await?;

    get_flash_sale(pool, id).await
}

pub async fn delete_flash_sale(pool: &PgPool, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM flash_sales WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
