//! Back-office login

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::api::ApiResult;
use crate::auth::AdminIdentity;
use crate::auth::admin_auth::create_token;
use crate::state::AppState;
use crate::util::verify_password;

/// POST /api/admin/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Unix seconds
    pub expires_at: usize,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    if !verify_password(&req.password, &state.admin_password_hash) {
        tracing::warn!("Admin login failed");
        return Err(AppError::invalid_credentials());
    }

    let (token, expires_at) = create_token(&state.jwt_secret).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    tracing::info!("Admin logged in");
    Ok(Json(LoginResponse { token, expires_at }))
}

#[derive(Serialize)]
pub struct SessionInfo {
    pub subject: String,
    pub expires_at: usize,
}

/// GET /api/admin/me
pub async fn me(Extension(identity): Extension<AdminIdentity>) -> ApiResult<SessionInfo> {
    Ok(Json(SessionInfo {
        subject: identity.subject,
        expires_at: identity.expires_at,
    }))
}
