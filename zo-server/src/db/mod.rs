//! Database access layer

pub mod clients;
pub mod favorites;
pub mod flash_sales;
pub mod orders;
pub mod products;
pub mod settings;
pub mod stock;
pub mod testimonials;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
