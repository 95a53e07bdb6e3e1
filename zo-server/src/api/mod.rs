//! HTTP API for zo-server
//!
//! - storefront: `/api/...` (no auth)
//! - back-office: `/api/admin/...` (admin JWT)
//! - console: `/api/admin/console/ws?token=` (JWT in query)

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod console_ws;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod testimonials;

use axum::routing::{delete, get, post};
use axum::{Json, Router};
use http::{HeaderName, HeaderValue};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::db::BoxError;
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Log a database error and hide it behind `InternalError`
pub(crate) fn internal(e: BoxError) -> AppError {
    tracing::error!(error = %e, "Database error");
    AppError::new(ErrorCode::InternalError)
}

/// `?page=&per_page=` query
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    /// `(limit, offset)`: 20 per page by default, at most 100
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (per_page, (page - 1) * per_page)
    }
}

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    match allowed_origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}

fn storefront_router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(catalog::list_products))
        .route("/api/products/{id}", get(catalog::get_product))
        .route("/api/categories", get(catalog::list_categories))
        .route("/api/flash-sales/active", get(catalog::active_flash_sales))
        .route("/api/cart/quote", post(cart::quote))
        .route("/api/orders", post(orders::checkout))
        .route("/api/clients/{phone}/orders", get(orders::client_orders))
        .route(
            "/api/clients/{phone}/favorites",
            get(favorites::list).post(favorites::add),
        )
        .route(
            "/api/clients/{phone}/favorites/{product_id}",
            delete(favorites::remove),
        )
        .route("/api/testimonials", get(testimonials::list_visible))
}

/// Full application: routes, state and tower-http layers
pub fn create_router(state: AppState, cors_allowed_origin: Option<&str>) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health::health_check))
        .merge(storefront_router())
        .merge(admin::router(state.clone()))
        .route("/api/admin/console/ws", get(console_ws::handle_console_ws))
        .layer(cors_layer(cors_allowed_origin))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, XRequestId))
        .with_state(state)
}
