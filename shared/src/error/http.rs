//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::NotFound
            | Self::OrderNotFound
            | Self::FlashSaleNotFound
            | Self::ProductNotFound
            | Self::ProductSizeNotFound
            | Self::TestimonialNotFound
            | Self::ClientNotFound => StatusCode::NOT_FOUND,

            Self::AlreadyExists
            | Self::OrderInvalidTransition
            | Self::OrderAlreadyCancelled
            | Self::ProductOutOfStock => StatusCode::CONFLICT,

            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            Self::PermissionDenied | Self::AdminRequired => StatusCode::FORBIDDEN,

            Self::TooManyAttempts | Self::ResourceLimitExceeded => StatusCode::TOO_MANY_REQUESTS,

            // Transient, the client can retry
            Self::NetworkError | Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            Self::Unknown | Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // Validation and business rule errors
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
