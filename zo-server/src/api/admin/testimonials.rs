//! Testimonial moderation

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Testimonial, TestimonialCreate, TestimonialUpdate};
use shared::util::now_millis;

use crate::api::{ApiResult, internal};
use crate::db;
use crate::state::AppState;

fn validate_rating(rating: i32) -> Result<(), AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::new(ErrorCode::ValueOutOfRange).with_detail("rating", rating));
    }
    Ok(())
}

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::TestimonialNotFound).with_detail("testimonial_id", id)
}

/// GET /api/admin/testimonials (hidden ones included)
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Testimonial>> {
    let testimonials = db::testimonials::list_testimonials(&state.pool, false)
        .await
        .map_err(internal)?;
    Ok(Json(testimonials))
}

/// POST /api/admin/testimonials
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<TestimonialCreate>,
) -> ApiResult<Testimonial> {
    if data.client_name.trim().is_empty() || data.content.trim().is_empty() {
        return Err(AppError::validation("client_name and content are required"));
    }
    validate_rating(data.rating)?;

    let testimonial = db::testimonials::create_testimonial(&state.pool, &data, now_millis())
        .await
        .map_err(internal)?;
    Ok(Json(testimonial))
}

/// PUT /api/admin/testimonials/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<TestimonialUpdate>,
) -> ApiResult<Testimonial> {
    if let Some(rating) = data.rating {
        validate_rating(rating)?;
    }
    let testimonial = db::testimonials::update_testimonial(&state.pool, id, &data)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(testimonial))
}

/// DELETE /api/admin/testimonials/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    if !db::testimonials::delete_testimonial(&state.pool, id)
        .await
        .map_err(internal)?
    {
        return Err(not_found(id));
    }
    Ok(Json(ApiResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert_eq!(validate_rating(0).unwrap_err().code, ErrorCode::ValueOutOfRange);
        assert!(validate_rating(6).is_err());
    }
}
