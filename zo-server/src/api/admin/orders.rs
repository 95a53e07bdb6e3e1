//! Order management

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::console::ConsoleMessage;
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderDetail, OrderStatus, OrderStatusUpdate};
use shared::util::now_millis;

use crate::api::{ApiResult, PageQuery, internal};
use crate::db;
use crate::state::AppState;

/// GET /api/admin/orders
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> ApiResult<Vec<Order>> {
    let (limit, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .limit_offset();
    let orders = db::orders::list_orders(&state.pool, query.status, limit, offset)
        .await
        .map_err(internal)?;
    Ok(Json(orders))
}

/// GET /api/admin/orders/{id}
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<OrderDetail> {
    let detail = db::orders::get_order_detail(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id))?;
    Ok(Json(detail))
}

/// PUT /api/admin/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<OrderStatusUpdate>,
) -> ApiResult<Order> {
    let order = db::orders::update_status(&state.pool, id, req.status, now_millis()).await?;

    tracing::info!(order_id = id, status = %order.status, "Order status updated");
    state.console.publish(ConsoleMessage::OrderStatusChanged {
        order_id: id,
        status: order.status,
    });
    Ok(Json(order))
}
