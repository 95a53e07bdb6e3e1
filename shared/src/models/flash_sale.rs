//! Flash Sale Model

use serde::{Deserialize, Serialize};

/// Product entry of a flash sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashSaleProduct {
    pub product_id: i64,
    /// Overrides the sale's global discount when set
    pub discount_percentage: Option<f64>,
}

/// Time-boxed promotion over a subset of products
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashSale {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub global_discount_percentage: f64,
    /// Window start (Unix millis, inclusive)
    pub start_date: i64,
    /// Window end (Unix millis, inclusive)
    pub end_date: i64,
    pub is_active: bool,
    pub products: Vec<FlashSaleProduct>,
    pub created_at: i64,
}

/// Create flash sale payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashSaleCreate {
    pub title: String,
    pub description: Option<String>,
    pub global_discount_percentage: f64,
    pub start_date: i64,
    pub end_date: i64,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub products: Vec<FlashSaleProduct>,
}

/// Update flash sale payload; `products` replaces the whole list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlashSaleUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub global_discount_percentage: Option<f64>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub is_active: Option<bool>,
    pub products: Option<Vec<FlashSaleProduct>>,
}
