//! Client favorites, keyed by phone number

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{FavoriteAdd, ProductView};
use shared::pricing::price_product;
use shared::util::now_millis;

use crate::db;
use crate::state::AppState;

use super::orders::parse_phone;
use super::{ApiResult, internal};

/// GET /api/clients/{phone}/favorites
pub async fn list(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> ApiResult<Vec<ProductView>> {
    let phone = parse_phone(&phone)?;
    let now = now_millis();
    let products = db::favorites::list_favorite_products(&state.pool, &phone)
        .await
        .map_err(internal)?;
    let sales = db::flash_sales::list_active(&state.pool, now)
        .await
        .map_err(internal)?;
    Ok(Json(
        products
            .into_iter()
            .map(|p| price_product(p, &sales, now))
            .collect(),
    ))
}

/// POST /api/clients/{phone}/favorites
pub async fn add(
    State(state): State<AppState>,
    Path(phone): Path<String>,
    Json(req): Json<FavoriteAdd>,
) -> ApiResult<ApiResponse<()>> {
    let phone = parse_phone(&phone)?;
    db::products::get_product(&state.pool, req.product_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", req.product_id)
        })?;

    db::favorites::add_favorite(&state.pool, &phone, req.product_id, now_millis())
        .await
        .map_err(internal)?;
    Ok(Json(ApiResponse::ok()))
}

/// DELETE /api/clients/{phone}/favorites/{product_id}
pub async fn remove(
    State(state): State<AppState>,
    Path((phone, product_id)): Path<(String, i64)>,
) -> ApiResult<ApiResponse<()>> {
    let phone = parse_phone(&phone)?;
    db::favorites::remove_favorite(&state.pool, &phone, product_id)
        .await
        .map_err(internal)?;
    Ok(Json(ApiResponse::ok()))
}
