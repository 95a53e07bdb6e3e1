//! Product management and stock intake

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{
    Product, ProductCreate, ProductUpdate, SizeStock, StockAddition, StockHistoryEntry,
};
use shared::pricing::validate_price;
use shared::util::now_millis;

use crate::api::{ApiResult, PageQuery, internal};
use crate::db;
use crate::db::products::ProductFilter;
use crate::state::AppState;

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", id)
}

/// Stock levels may be zero, never negative
fn validate_sizes(sizes: &SizeStock) -> Result<(), AppError> {
    for (size, qty) in sizes {
        if size.trim().is_empty() {
            return Err(AppError::validation("size name is required"));
        }
        if *qty < 0 {
            return Err(AppError::new(ErrorCode::StockInvalidQuantity)
                .with_detail("size", size.as_str())
                .with_detail("quantity", *qty));
        }
    }
    Ok(())
}

/// Intake must add something and never subtract
fn validate_addition(addition: &StockAddition) -> Result<(), AppError> {
    validate_sizes(&addition.sizes)?;
    if addition.sizes.values().all(|qty| *qty == 0) {
        return Err(AppError::new(ErrorCode::StockInvalidQuantity));
    }
    Ok(())
}

/// GET /api/admin/products
#[derive(Debug, Deserialize)]
pub struct AdminProductsQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<AdminProductsQuery>,
) -> ApiResult<Vec<Product>> {
    let (limit, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .limit_offset();
    let filter = ProductFilter {
        category: query.category.as_deref().filter(|c| !c.is_empty()),
        search: query.search.as_deref().filter(|s| !s.trim().is_empty()),
        active_only: false,
    };
    let products = db::products::list_products(&state.pool, &filter, limit, offset)
        .await
        .map_err(internal)?;
    Ok(Json(products))
}

/// GET /api/admin/products/{id}
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Product> {
    let product = db::products::get_product(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(product))
}

/// POST /api/admin/products
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<ProductCreate>,
) -> ApiResult<Product> {
    if data.title.trim().is_empty() {
        return Err(AppError::validation("title is required"));
    }
    if data.category.trim().is_empty() {
        return Err(AppError::validation("category is required"));
    }
    validate_price(data.price)?;
    validate_sizes(&data.sizes)?;

    let product = db::products::create_product(&state.pool, &data, now_millis())
        .await
        .map_err(internal)?;
    tracing::info!(product_id = product.id, title = %product.title, "Product created");
    Ok(Json(product))
}

/// PUT /api/admin/products/{id}
///
/// Replacing `sizes` here bypasses stock intake, so the product is flagged
/// as edited and left out of the stock comparison.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<ProductUpdate>,
) -> ApiResult<Product> {
    if data.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::validation("title must not be empty"));
    }
    if let Some(price) = data.price {
        validate_price(price)?;
    }
    if let Some(sizes) = &data.sizes {
        validate_sizes(sizes)?;
    }

    let product = db::products::update_product(&state.pool, id, &data, now_millis())
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(id))?;

    if data.sizes.is_some() {
        tracing::info!(product_id = id, "Product stock edited directly");
    }
    Ok(Json(product))
}

/// DELETE /api/admin/products/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    if !db::products::delete_product(&state.pool, id)
        .await
        .map_err(internal)?
    {
        return Err(not_found(id));
    }
    tracing::info!(product_id = id, "Product deleted");
    Ok(Json(ApiResponse::ok()))
}

/// POST /api/admin/products/{id}/stock
pub async fn add_stock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(addition): Json<StockAddition>,
) -> ApiResult<Product> {
    validate_addition(&addition)?;

    let (product, entry) = db::products::add_stock(&state.pool, id, &addition, now_millis())
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(product_id = id, added = entry.total_added(), "Stock added");
    Ok(Json(product))
}

/// GET /api/admin/products/{id}/stock
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<StockHistoryEntry>> {
    let entries = db::stock::list_product_history(&state.pool, id)
        .await
        .map_err(internal)?;
    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(entries: &[(&str, i64)]) -> SizeStock {
        entries.iter().map(|(s, q)| (s.to_string(), *q)).collect()
    }

    #[test]
    fn negative_stock_is_rejected() {
        assert!(validate_sizes(&sizes(&[("S", 0), ("M", 4)])).is_ok());
        let err = validate_sizes(&sizes(&[("M", -1)])).unwrap_err();
        assert_eq!(err.code, ErrorCode::StockInvalidQuantity);
    }

    #[test]
    fn blank_size_name_is_rejected() {
        let err = validate_sizes(&sizes(&[(" ", 3)])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn empty_intake_is_rejected() {
        let addition = StockAddition {
            sizes: sizes(&[("M", 0)]),
            note: None,
        };
        assert_eq!(
            validate_addition(&addition).unwrap_err().code,
            ErrorCode::StockInvalidQuantity
        );

        let addition = StockAddition {
            sizes: sizes(&[("M", 2)]),
            note: Some("Arrivage".into()),
        };
        assert!(validate_addition(&addition).is_ok());
    }
}
