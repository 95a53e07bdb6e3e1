//! Stock reconciliation: comparison table, reference date, edited markers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::comparison::{StockComparison, StockStatus, compute_comparison};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::ReferenceDate;
use shared::util::now_millis;
use sqlx::PgPool;

use crate::api::{ApiResult, internal};
use crate::db::{self, BoxError};
use crate::state::AppState;

/// GET /api/admin/stock/comparison?status=
#[derive(Debug, Deserialize)]
pub struct ComparisonQuery {
    pub status: Option<StockStatus>,
}

/// Load every reconciliation input at the stored reference date and aggregate
pub(super) async fn load_comparison(pool: &PgPool) -> Result<StockComparison, BoxError> {
    let reference = db::stock::get_reference_date(pool).await?.reference_date;
    let products = db::products::list_product_refs(pool).await?;
    let history = db::stock::list_history(pool, reference).await?;
    let lines = db::stock::list_order_lines(pool, reference).await?;
    let edited = db::stock::edited_product_ids(pool).await?;

    Ok(compute_comparison(&products, &history, &lines, &edited, reference))
}

/// Rows are filtered by `status`; the summary always covers every row.
pub async fn comparison(
    State(state): State<AppState>,
    Query(query): Query<ComparisonQuery>,
) -> ApiResult<StockComparison> {
    let full = load_comparison(&state.pool).await.map_err(internal)?;
    if query.status.is_none() {
        return Ok(Json(full));
    }

    Ok(Json(StockComparison {
        rows: full.filter(query.status).cloned().collect(),
        summary: full.summary,
    }))
}

/// GET /api/admin/stock/reference-date
pub async fn get_reference_date(State(state): State<AppState>) -> ApiResult<ReferenceDate> {
    let value = db::stock::get_reference_date(&state.pool)
        .await
        .map_err(internal)?;
    Ok(Json(value))
}

/// PUT /api/admin/stock/reference-date (`null` clears it)
pub async fn set_reference_date(
    State(state): State<AppState>,
    Json(value): Json<ReferenceDate>,
) -> ApiResult<ReferenceDate> {
    if value.reference_date.is_some_and(|d| d < 0) {
        return Err(AppError::new(ErrorCode::ValueOutOfRange)
            .with_detail("reference_date", value.reference_date));
    }
    db::stock::set_reference_date(&state.pool, value, now_millis())
        .await
        .map_err(internal)?;
    tracing::info!(reference_date = ?value.reference_date, "Stock reference date updated");
    Ok(Json(value))
}

/// DELETE /api/admin/stock/edited/{id}
pub async fn clear_edited(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    let cleared = db::stock::clear_edited(&state.pool, product_id)
        .await
        .map_err(internal)?;
    if cleared {
        tracing::info!(product_id, "Edited marker cleared");
    }
    Ok(Json(ApiResponse::ok()))
}
