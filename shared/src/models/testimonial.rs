//! Testimonial Model

use serde::{Deserialize, Serialize};

/// Satisfied-client testimonial shown on the storefront
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Testimonial {
    pub id: i64,
    pub client_name: String,
    pub content: String,
    /// 1..=5
    pub rating: i32,
    pub image_url: Option<String>,
    pub is_visible: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestimonialCreate {
    pub client_name: String,
    pub content: String,
    pub rating: i32,
    pub image_url: Option<String>,
    pub is_visible: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestimonialUpdate {
    pub client_name: Option<String>,
    pub content: Option<String>,
    pub rating: Option<i32>,
    pub image_url: Option<String>,
    pub is_visible: Option<bool>,
}
