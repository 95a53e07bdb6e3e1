//! Admin JWT authentication for the back-office API

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

/// Subject of every back-office token (single shared admin account)
pub const ADMIN_SUBJECT: &str = "admin";

const JWT_EXPIRY_HOURS: i64 = 12;

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated admin, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub subject: String,
    /// Token expiry (Unix seconds)
    pub expires_at: usize,
}

/// Create an admin token, returning it with its expiry (Unix seconds)
pub fn create_token(secret: &str) -> Result<(String, usize), jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let exp = (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize;
    let claims = AdminClaims {
        sub: ADMIN_SUBJECT.to_string(),
        exp,
        iat: now.timestamp() as usize,
    };

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, exp))
}

pub fn verify_token(token: &str, secret: &str) -> Result<AdminClaims, AppError> {
    let data = jsonwebtoken::decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid or expired token"),
        }
    })?;

    if data.claims.sub != ADMIN_SUBJECT {
        return Err(AppError::new(ErrorCode::AdminRequired));
    }
    Ok(data.claims)
}

/// Verifies the Bearer token and injects [`AdminIdentity`]
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::not_authenticated().into_response())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::invalid_token("Invalid Authorization format").into_response())?;

    let claims = verify_token(token, &state.jwt_secret).map_err(IntoResponse::into_response)?;

    request.extensions_mut().insert(AdminIdentity {
        subject: claims.sub,
        expires_at: claims.exp,
    });

    Ok(next.run(request).await)
}
