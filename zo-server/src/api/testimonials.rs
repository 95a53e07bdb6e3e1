//! Public testimonials

use axum::{Json, extract::State};
use shared::models::Testimonial;

use crate::db;
use crate::state::AppState;

use super::{ApiResult, internal};

/// GET /api/testimonials
pub async fn list_visible(State(state): State<AppState>) -> ApiResult<Vec<Testimonial>> {
    let testimonials = db::testimonials::list_testimonials(&state.pool, true)
        .await
        .map_err(internal)?;
    Ok(Json(testimonials))
}
