//! Error handling for the Zo storefront
//!
//! - [`ErrorCode`]: numeric codes shared with the web front end
//! - [`ErrorCategory`]: classification of codes by range
//! - [`AppError`]: code, message and optional details
//! - [`ApiResponse`]: envelope for JSON responses
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Promotion errors
//! - 6xxx: Product and stock errors
//! - 7xxx: Client errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::ProductNotFound);
//!
//! let err = AppError::validation("Quantity must be positive")
//!     .with_detail("field", "quantity");
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(2));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
