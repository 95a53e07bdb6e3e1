//! Stock history Model

use super::product::SizeStock;
use serde::{Deserialize, Serialize};

/// One stock-addition event: quantities added per size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StockHistoryEntry {
    pub id: i64,
    pub product_id: i64,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub added_by_size: SizeStock,
    pub note: Option<String>,
    pub created_at: i64,
}

impl StockHistoryEntry {
    pub fn total_added(&self) -> i64 {
        self.added_by_size.values().sum()
    }
}

/// Stock addition payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAddition {
    pub sizes: SizeStock,
    pub note: Option<String>,
}

/// Reconciliation cutoff (Unix millis); `None` counts all history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDate {
    pub reference_date: Option<i64>,
}
