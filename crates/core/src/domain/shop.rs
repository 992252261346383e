use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShopId(pub i64);

impl std::fmt::Display for ShopId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered marketplace shop. New shops start unverified and inactive
/// listings stay hidden; verification and suspension are operator actions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub gst_number: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub rating: Option<Decimal>,
    pub total_orders: u32,
    pub total_revenue: Decimal,
    pub created_at: DateTime<Utc>,
}
