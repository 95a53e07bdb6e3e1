//! Order database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{CartLine, FlashSale, Order, OrderDetail, OrderItem, OrderStatus, Product};
use shared::pricing::quote_line;
use shared::util::snowflake_id;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{BTreeMap, HashMap};

use super::BoxError;
use super::products::{lock_products, write_sizes};
use crate::error::ServiceResult;

const ORDER_COLUMNS: &str =
    "id, client_id, customer_name, phone, address, note, status, total_amount, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, title, size, quantity, unit_price, discount_percentage, line_total";

pub fn parse_status(s: &str) -> Result<OrderStatus, BoxError> {
    s.parse::<OrderStatus>().map_err(Into::into)
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    client_id: Option<i64>,
    customer_name: String,
    phone: String,
    address: String,
    note: Option<String>,
    status: String,
    total_amount: i64,
    created_at: i64,
    updated_at: i64,
}

impl OrderRow {
    fn into_model(self) -> Result<Order, BoxError> {
        Ok(Order {
            id: self.id,
            client_id: self.client_id,
            customer_name: self.customer_name,
            phone: self.phone,
            address: self.address,
            note: self.note,
            status: parse_status(&self.status)?,
            total_amount: self.total_amount,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn into_models(rows: Vec<OrderRow>) -> Result<Vec<Order>, BoxError> {
    rows.into_iter().map(OrderRow::into_model).collect()
}

/// Validated checkout data (phone already normalized)
pub struct NewOrder<'a> {
    pub customer_name: &'a str,
    pub phone: &'a str,
    pub address: &'a str,
    pub email: Option<&'a str>,
    pub note: Option<&'a str>,
    pub lines: &'a [CartLine],
}

/// Place an order: price lines, check and decrement stock, upsert the client
/// and record order + lines, all in one transaction.
pub async fn create_order(
    pool: &PgPool,
    order: &NewOrder<'_>,
    sales: &[FlashSale],
    now: i64,
) -> ServiceResult<OrderDetail> {
    if order.lines.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty).into());
    }

    let mut product_ids: Vec<i64> = order.lines.iter().map(|l| l.product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    let mut tx = pool.begin().await?;

    let mut products: HashMap<i64, Product> = lock_products(&mut tx, &product_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let order_id = snowflake_id();
    let mut items = Vec::with_capacity(order.lines.len());
    let mut requested: BTreeMap<(i64, &str), i64> = BTreeMap::new();

    for line in order.lines {
        let product = products.get(&line.product_id).ok_or_else(|| {
            AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", line.product_id)
        })?;
        let quoted = quote_line(product, line, sales, now)?;

        let total = requested
            .entry((line.product_id, line.size.as_str()))
            .or_insert(0);
        *total += line.quantity;
        if *total > quoted.available {
            return Err(AppError::out_of_stock(line.product_id, &line.size, quoted.available).into());
        }

        items.push(OrderItem {
            id: snowflake_id(),
            order_id,
            product_id: quoted.product_id,
            title: quoted.title,
            size: quoted.size,
            quantity: quoted.quantity,
            unit_price: quoted.final_unit_price,
            discount_percentage: quoted.discount_percentage,
            line_total: quoted.line_total,
        });
    }

    for ((product_id, size), qty) in &requested {
        if let Some(product) = products.get_mut(product_id)
            && let Some(stock) = product.sizes.get_mut(*size)
        {
            *stock -= qty;
        }
    }
    for product_id in &product_ids {
        if let Some(product) = products.get(product_id) {
            write_sizes(&mut tx, product, now).await?;
        }
    }

    let client_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO clients (id, name, phone, email, address, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (phone) DO UPDATE SET
            name = EXCLUDED.name,
            email = COALESCE(EXCLUDED.email, clients.email),
            address = EXCLUDED.address
        RETURNING id
        "#,
    )
    .bind(snowflake_id())
    .bind(order.customer_name)
    .bind(order.phone)
    .bind(order.email)
    .bind(order.address)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let total_amount: i64 = items.iter().map(|i| i.line_total).sum();

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        INSERT INTO orders (id, client_id, customer_name, phone, address, note, status, total_amount, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(order_id)
    .bind(client_id)
    .bind(order.customer_name)
    .bind(order.phone)
    .bind(order.address)
    .bind(order.note)
    .bind(OrderStatus::Pending.as_str())
    .bind(total_amount)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    insert_items(&mut tx, &items).await?;

    tx.commit().await?;

    Ok(OrderDetail {
        order: row.into_model()?,
        items,
    })
}

async fn insert_items(tx: &mut Transaction<'_, Postgres>, items: &[OrderItem]) -> Result<(), sqlx::Error> {
    let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
    let order_ids: Vec<i64> = items.iter().map(|i| i.order_id).collect();
    let product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
    let titles: Vec<String> = items.iter().map(|i| i.title.clone()).collect();
    let sizes: Vec<String> = items.iter().map(|i| i.size.clone()).collect();
    let quantities: Vec<i64> = items.iter().map(|i| i.quantity).collect();
    let unit_prices: Vec<i64> = items.iter().map(|i| i.unit_price).collect();
    let discounts: Vec<Option<f64>> = items.iter().map(|i| i.discount_percentage).collect();
    let line_totals: Vec<i64> = items.iter().map(|i| i.line_total).collect();

    sqlx::query(
        r#"
        INSERT INTO order_items (id, order_id, product_id, title, size, quantity, unit_price, discount_percentage, line_total)
        SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::bigint[], $4::text[], $5::text[], $6::bigint[], $7::bigint[], $8::double precision[], $9::bigint[])
        "#,
    )
    .bind(&ids)
    .bind(&order_ids)
    .bind(&product_ids)
    .bind(&titles)
    .bind(&sizes)
    .bind(&quantities)
    .bind(&unit_prices)
    .bind(&discounts)
    .bind(&line_totals)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn list_orders(
    pool: &PgPool,
    status: Option<OrderStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Order>, BoxError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        SELECT {ORDER_COLUMNS}
        FROM orders
        WHERE $1::text IS NULL OR status = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(status.map(|s| s.as_str()))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    into_models(rows)
}

pub async fn list_orders_by_phone(pool: &PgPool, phone: &str) -> Result<Vec<Order>, BoxError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE phone = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(phone)
    .fetch_all(pool)
    .await?;
    into_models(rows)
}

pub async fn list_orders_by_client(pool: &PgPool, client_id: i64) -> Result<Vec<Order>, BoxError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE client_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(client_id)
    .fetch_all(pool)
    .await?;
    into_models(rows)
}

pub async fn get_order_detail(pool: &PgPool, id: i64) -> Result<Option<OrderDetail>, BoxError> {
    let Some(row) = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
    ))
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(OrderDetail {
        order: row.into_model()?,
        items,
    }))
}

/// Move an order to `next`. Cancelling puts the lines back into stock.
pub async fn update_status(pool: &PgPool, id: i64, next: OrderStatus, now: i64) -> ServiceResult<Order> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id))?
    .into_model()?;

    if !current.status.can_transition_to(next) {
        let code = if current.status == OrderStatus::Cancelled {
            ErrorCode::OrderAlreadyCancelled
        } else {
            ErrorCode::OrderInvalidTransition
        };
        return Err(AppError::new(code)
            .with_detail("from", current.status.as_str())
            .with_detail("to", next.as_str())
            .into());
    }

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(next.as_str())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    if next == OrderStatus::Cancelled {
        restore_stock(&mut tx, id, now).await?;
    }

    tx.commit().await?;
    Ok(row.into_model()?)
}

async fn restore_stock(tx: &mut Transaction<'_, Postgres>, order_id: i64, now: i64) -> Result<(), sqlx::Error> {
    let lines: Vec<(i64, String, i64)> =
        sqlx::query_as("SELECT product_id, size, quantity FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&mut **tx)
            .await?;

    let mut ids: Vec<i64> = lines.iter().map(|(id, _, _)| *id).collect();
    ids.sort_unstable();
    ids.dedup();

    // Deleted products are skipped
    let mut products: HashMap<i64, Product> = lock_products(tx, &ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    for (product_id, size, qty) in lines {
        if let Some(product) = products.get_mut(&product_id) {
            *product.sizes.entry(size).or_insert(0) += qty;
        }
    }
    for product in products.values() {
        write_sizes(tx, product, now).await?;
    }
    Ok(())
}

pub async fn count_orders(pool: &PgPool) -> Result<i64, BoxError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Most recent order by creation time
pub async fn latest_order(pool: &PgPool) -> Result<Option<Order>, BoxError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await?;
    row.map(OrderRow::into_model).transpose()
}

pub async fn count_by_status(pool: &PgPool) -> Result<BTreeMap<OrderStatus, i64>, BoxError> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
            .fetch_all(pool)
            .await?;

    let mut counts: BTreeMap<OrderStatus, i64> = OrderStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for (status, count) in rows {
        counts.insert(parse_status(&status)?, count);
    }
    Ok(counts)
}

/// Sum of non-cancelled order totals
pub async fn revenue(pool: &PgPool) -> Result<i64, BoxError> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders WHERE status <> 'cancelled'",
    )
    .fetch_one(pool)
    .await?;
    Ok(total)
}
