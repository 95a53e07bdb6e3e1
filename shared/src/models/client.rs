//! Client Model

use serde::{Deserialize, Serialize};

/// Storefront client, identified by phone number
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: i64,
}

/// Client with order aggregates (admin views)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ClientSummary {
    #[cfg_attr(feature = "db", sqlx(flatten))]
    #[serde(flatten)]
    pub client: Client,
    pub order_count: i64,
    /// Sum of non-cancelled order totals
    pub lifetime_spend: i64,
}
