//! Storefront catalog: products with flash prices, categories, active sales

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{FlashSale, ProductView};
use shared::pricing::price_product;
use shared::util::now_millis;

use crate::db;
use crate::db::products::ProductFilter;
use crate::state::AppState;

use super::{ApiResult, PageQuery, internal};

/// GET /api/products
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> ApiResult<Vec<ProductView>> {
    let (limit, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .limit_offset();
    let filter = ProductFilter {
        category: query.category.as_deref().filter(|c| !c.is_empty()),
        search: query.search.as_deref().filter(|s| !s.trim().is_empty()),
        active_only: true,
    };

    let now = now_millis();
    let sales = db::flash_sales::list_active(&state.pool, now)
        .await
        .map_err(internal)?;
    let products = db::products::list_products(&state.pool, &filter, limit, offset)
        .await
        .map_err(internal)?;

    Ok(Json(
        products
            .into_iter()
            .map(|p| price_product(p, &sales, now))
            .collect(),
    ))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ProductView> {
    let product = db::products::get_product(&state.pool, id)
        .await
        .map_err(internal)?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", id))?;

    let now = now_millis();
    let sales = db::flash_sales::list_active(&state.pool, now)
        .await
        .map_err(internal)?;
    Ok(Json(price_product(product, &sales, now)))
}

/// GET /api/categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let categories = db::products::list_categories(&state.pool)
        .await
        .map_err(internal)?;
    Ok(Json(categories))
}

/// GET /api/flash-sales/active
pub async fn active_flash_sales(State(state): State<AppState>) -> ApiResult<Vec<FlashSale>> {
    let sales = db::flash_sales::list_active(&state.pool, now_millis())
        .await
        .map_err(internal)?;
    Ok(Json(sales))
}
