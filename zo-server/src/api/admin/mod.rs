//! Back-office API, split into sub-modules by domain
//!
//! Everything except `POST /api/admin/login` sits behind
//! [`admin_auth_middleware`].

mod auth;
mod clients;
mod flash_sales;
mod orders;
mod products;
mod stats;
mod stock;
mod testimonials;

use axum::routing::{delete, get, post, put};
use axum::{Router, middleware};

use crate::auth::admin_auth::admin_auth_middleware;
use crate::auth::rate_limit::login_rate_limit;
use crate::state::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    let login = Router::new()
        .route("/api/admin/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    let protected = Router::new()
        .route("/api/admin/me", get(auth::me))
        // Products and stock intake
        .route(
            "/api/admin/products",
            get(products::list).post(products::create),
        )
        .route(
            "/api/admin/products/{id}",
            get(products::get).put(products::update).delete(products::remove),
        )
        .route(
            "/api/admin/products/{id}/stock",
            get(products::history).post(products::add_stock),
        )
        // Stock reconciliation
        .route("/api/admin/stock/comparison", get(stock::comparison))
        .route(
            "/api/admin/stock/reference-date",
            get(stock::get_reference_date).put(stock::set_reference_date),
        )
        .route("/api/admin/stock/edited/{id}", delete(stock::clear_edited))
        // Orders
        .route("/api/admin/orders", get(orders::list))
        .route("/api/admin/orders/{id}", get(orders::detail))
        .route("/api/admin/orders/{id}/status", put(orders::update_status))
        // Clients
        .route("/api/admin/clients", get(clients::list))
        .route(
            "/api/admin/clients/{id}",
            get(clients::detail).delete(clients::remove),
        )
        // Flash sales
        .route(
            "/api/admin/flash-sales",
            get(flash_sales::list).post(flash_sales::create),
        )
        .route(
            "/api/admin/flash-sales/{id}",
            get(flash_sales::get)
                .put(flash_sales::update)
                .delete(flash_sales::remove),
        )
        // Testimonials
        .route(
            "/api/admin/testimonials",
            get(testimonials::list).post(testimonials::create),
        )
        .route(
            "/api/admin/testimonials/{id}",
            put(testimonials::update).delete(testimonials::remove),
        )
        // Dashboard
        .route("/api/admin/stats", get(stats::get_stats))
        .route_layer(middleware::from_fn_with_state(
            state,
            admin_auth_middleware,
        ));

    login.merge(protected)
}
