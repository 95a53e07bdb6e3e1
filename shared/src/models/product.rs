//! Product Model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-size stock, keyed by size label ("S", "M", "38", ...)
pub type SizeStock = BTreeMap<String, i64>;

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    /// Price in whole currency units
    pub price: i64,
    /// Current stock per size
    #[cfg_attr(feature = "db", sqlx(json))]
    pub sizes: SizeStock,
    pub images: Vec<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Stock of one size, `None` when the size is not offered
    pub fn stock_for(&self, size: &str) -> Option<i64> {
        self.sizes.get(size).copied()
    }
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub price: i64,
    #[serde(default)]
    pub sizes: SizeStock,
    #[serde(default)]
    pub images: Vec<String>,
    pub is_active: Option<bool>,
}

/// Update product payload
///
/// Setting `sizes` overwrites stock directly and marks the product as edited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<i64>,
    pub sizes: Option<SizeStock>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Storefront view of a product with its flash price resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// Discount applied, when a flash sale covers the product
    pub discount_percentage: Option<f64>,
    /// Price after the flash discount (equals `price` otherwise)
    pub final_price: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(sizes: &[(&str, i64)]) -> Product {
        Product {
            id: 1,
            title: "Robe wax".to_string(),
            description: None,
            category: "robes".to_string(),
            price: 15000,
            sizes: sizes.iter().map(|(s, q)| (s.to_string(), *q)).collect(),
            images: vec![],
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn stock_lookup_by_size() {
        let product = make_product(&[("S", 2), ("M", 0)]);
        assert_eq!(product.stock_for("S"), Some(2));
        assert_eq!(product.stock_for("M"), Some(0));
        assert_eq!(product.stock_for("XL"), None);
    }

    #[test]
    fn view_flattens_product_fields() {
        let view = ProductView {
            product: make_product(&[("M", 3)]),
            discount_percentage: Some(25.0),
            final_price: 11250,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["title"], "Robe wax");
        assert_eq!(json["sizes"]["M"], 3);
        assert_eq!(json["final_price"], 11250);
    }
}
