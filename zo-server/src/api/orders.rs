//! Storefront checkout and order history

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{CheckoutRequest, Order, OrderDetail};
use shared::util::{normalize_phone, now_millis};

use crate::db;
use crate::db::orders::NewOrder;
use crate::state::AppState;

use super::{ApiResult, internal};

pub(crate) fn parse_phone(raw: &str) -> Result<String, AppError> {
    normalize_phone(raw).ok_or_else(|| AppError::new(ErrorCode::ClientInvalidPhone))
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(value)
}

/// POST /api/orders
pub async fn checkout(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<OrderDetail> {
    let customer_name = required("customer_name", &req.customer_name)?;
    let address = required("address", &req.address)?;
    let phone = parse_phone(&req.phone)?;
    if req.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }

    let now = now_millis();
    let sales = db::flash_sales::list_active(&state.pool, now)
        .await
        .map_err(internal)?;

    let new_order = NewOrder {
        customer_name,
        phone: &phone,
        address,
        email: req.email.as_deref().map(str::trim).filter(|e| !e.is_empty()),
        note: req.note.as_deref().map(str::trim).filter(|n| !n.is_empty()),
        lines: &req.items,
    };
    let detail = db::orders::create_order(&state.pool, &new_order, &sales, now).await?;

    tracing::info!(
        order_id = detail.order.id,
        total = detail.order.total_amount,
        lines = detail.items.len(),
        "Order placed"
    );
    Ok(Json(detail))
}

/// GET /api/clients/{phone}/orders
pub async fn client_orders(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> ApiResult<Vec<Order>> {
    let phone = parse_phone(&phone)?;
    let orders = db::orders::list_orders_by_phone(&state.pool, &phone)
        .await
        .map_err(internal)?;
    Ok(Json(orders))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("address", "  Dakar ").unwrap(), "Dakar");
        let err = required("address", "   ").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn phone_errors_use_client_code() {
        assert_eq!(parse_phone("abc").unwrap_err().code, ErrorCode::ClientInvalidPhone);
        assert!(parse_phone("+221 77 123 45 67").is_ok());
    }
}
