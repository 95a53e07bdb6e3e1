//! Shared types for the Zo storefront
//!
//! Domain models, error codes and the pure business logic (flash pricing,
//! stock comparison, order watch) used by zo-server and mirrored by the web
//! front end.

pub mod comparison;
pub mod console;
pub mod error;
pub mod models;
pub mod pricing;
pub mod util;
pub mod watch;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
