//! Client records

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{ClientSummary, Order};

use crate::api::{ApiResult, PageQuery, internal};
use crate::db;
use crate::state::AppState;

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::ClientNotFound).with_detail("client_id", id)
}

/// GET /api/admin/clients
#[derive(Debug, Deserialize)]
pub struct ClientsQuery {
    /// Name or phone fragment
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ClientsQuery>,
) -> ApiResult<Vec<ClientSummary>> {
    let (limit, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .limit_offset();
    let search = query.search.as_deref().filter(|s| !s.trim().is_empty());
    let clients = db::clients::list_clients(&state.pool, search, limit, offset)
        .await
        .map_err(internal)?;
    Ok(Json(clients))
}

#[derive(Serialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub summary: ClientSummary,
    pub orders: Vec<Order>,
}

/// GET /api/admin/clients/{id}
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ClientDetail> {
    let summary = db::clients::get_client_summary(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(id))?;
    let orders = db::orders::list_orders_by_client(&state.pool, id)
        .await
        .map_err(internal)?;
    Ok(Json(ClientDetail { summary, orders }))
}

/// DELETE /api/admin/clients/{id}
///
/// Orders survive with their customer snapshot; only the client link is cleared.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    if !db::clients::delete_client(&state.pool, id)
        .await
        .map_err(internal)?
    {
        return Err(not_found(id));
    }
    tracing::info!(client_id = id, "Client deleted");
    Ok(Json(ApiResponse::ok()))
}
