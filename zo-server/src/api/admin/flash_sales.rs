//! Flash sale management

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{FlashSale, FlashSaleCreate, FlashSaleProduct, FlashSaleUpdate};
use shared::pricing::validate_sale;
use shared::util::now_millis;

use crate::api::{ApiResult, internal};
use crate::db;
use crate::state::AppState;

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::FlashSaleNotFound).with_detail("flash_sale_id", id)
}

/// First listed product id absent from `existing`
fn first_missing(entries: &[FlashSaleProduct], existing: &[i64]) -> Option<i64> {
    entries
        .iter()
        .map(|e| e.product_id)
        .find(|id| !existing.contains(id))
}

async fn ensure_products_exist(
    state: &AppState,
    entries: &[FlashSaleProduct],
) -> Result<(), AppError> {
    if entries.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = entries.iter().map(|e| e.product_id).collect();
    let existing = db::products::existing_ids(&state.pool, &ids)
        .await
        .map_err(internal)?;
    match first_missing(entries, &existing) {
        Some(id) => Err(AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", id)),
        None => Ok(()),
    }
}

/// GET /api/admin/flash-sales
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<FlashSale>> {
    let sales = db::flash_sales::list_flash_sales(&state.pool)
        .await
        .map_err(internal)?;
    Ok(Json(sales))
}

/// GET /api/admin/flash-sales/{id}
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<FlashSale> {
    let sale = db::flash_sales::get_flash_sale(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(sale))
}

/// POST /api/admin/flash-sales
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<FlashSaleCreate>,
) -> ApiResult<FlashSale> {
    if data.title.trim().is_empty() {
        return Err(AppError::validation("title is required"));
    }
    validate_sale(
        data.global_discount_percentage,
        &data.products,
        data.start_date,
        data.end_date,
    )?;
    ensure_products_exist(&state, &data.products).await?;

    let sale = db::flash_sales::create_flash_sale(&state.pool, &data, now_millis())
        .await
        .map_err(internal)?;
    tracing::info!(
        flash_sale_id = sale.id,
        products = sale.products.len(),
        "Flash sale created"
    );
    Ok(Json(sale))
}

/// PUT /api/admin/flash-sales/{id}
///
/// The merged sale is validated before anything is written.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<FlashSaleUpdate>,
) -> ApiResult<FlashSale> {
    if data.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::validation("title must not be empty"));
    }

    let current = db::flash_sales::get_flash_sale(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(id))?;
    let entries = data.products.as_ref().unwrap_or(&current.products);
    validate_sale(
        data.global_discount_percentage.unwrap_or(current.global_discount_percentage),
        entries,
        data.start_date.unwrap_or(current.start_date),
        data.end_date.unwrap_or(current.end_date),
    )?;
    if let Some(products) = &data.products {
        ensure_products_exist(&state, products).await?;
    }

    let sale = db::flash_sales::update_flash_sale(&state.pool, id, &data)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(flash_sale_id = id, "Flash sale updated");
    Ok(Json(sale))
}

/// DELETE /api/admin/flash-sales/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    if !db::flash_sales::delete_flash_sale(&state.pool, id)
        .await
        .map_err(internal)?
    {
        return Err(not_found(id));
    }
    tracing::info!(flash_sale_id = id, "Flash sale deleted");
    Ok(Json(ApiResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(ids: &[i64]) -> Vec<FlashSaleProduct> {
        ids.iter()
            .map(|id| FlashSaleProduct {
                product_id: *id,
                discount_percentage: None,
            })
            .collect()
    }

    #[test]
    fn unknown_product_is_reported() {
        assert_eq!(first_missing(&entries(&[1, 2]), &[2, 1]), None);
        assert_eq!(first_missing(&entries(&[1, 7, 9]), &[1]), Some(7));
        assert_eq!(first_missing(&[], &[]), None);
    }
}
