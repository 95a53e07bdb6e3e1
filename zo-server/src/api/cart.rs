//! Server-side cart pricing

use axum::{Json, extract::State};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{CartLine, Product};
use shared::pricing::{CartQuote, quote_line};
use shared::util::now_millis;
use std::collections::HashMap;

use crate::db;
use crate::state::AppState;

use super::{ApiResult, internal};

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<CartLine>,
}

/// POST /api/cart/quote
///
/// Prices every line with the flash discounts active now and reports stock
/// availability. Nothing is reserved.
pub async fn quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> ApiResult<CartQuote> {
    if req.items.is_empty() {
        return Ok(Json(CartQuote::from_lines(Vec::new())));
    }

    let mut ids: Vec<i64> = req.items.iter().map(|l| l.product_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let now = now_millis();
    let products: HashMap<i64, Product> = db::products::get_products_by_ids(&state.pool, &ids)
        .await
        .map_err(internal)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let sales = db::flash_sales::list_active(&state.pool, now)
        .await
        .map_err(internal)?;

    let lines = req
        .items
        .iter()
        .map(|line| {
            let product = products.get(&line.product_id).ok_or_else(|| {
                AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", line.product_id)
            })?;
            quote_line(product, line, &sales, now)
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(CartQuote::from_lines(lines)))
}
