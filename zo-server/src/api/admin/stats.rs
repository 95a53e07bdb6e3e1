//! Dashboard statistics

use axum::{Json, extract::State};
use serde::Serialize;
use shared::comparison::ComparisonSummary;
use shared::models::OrderStatus;
use std::collections::BTreeMap;

use crate::api::{ApiResult, internal};
use crate::db;
use crate::state::AppState;

#[derive(Serialize)]
pub struct DashboardStats {
    pub orders_by_status: BTreeMap<OrderStatus, i64>,
    pub total_orders: i64,
    /// Sum of non-cancelled order totals
    pub revenue: i64,
    pub product_count: i64,
    /// Reconciliation counts at the current reference date
    pub stock: ComparisonSummary,
    pub console_sessions: usize,
}

/// GET /api/admin/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let pool = &state.pool;

    let orders_by_status = db::orders::count_by_status(pool).await.map_err(internal)?;
    let revenue = db::orders::revenue(pool).await.map_err(internal)?;
    let product_count = db::products::count_products(pool).await.map_err(internal)?;

    let stock = super::stock::load_comparison(pool)
        .await
        .map_err(internal)?
        .summary;

    Ok(Json(DashboardStats {
        total_orders: orders_by_status.values().sum(),
        orders_by_status,
        revenue,
        product_count,
        stock,
        console_sessions: state.console.session_count(),
    }))
}
