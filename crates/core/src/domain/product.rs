use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shop::ShopId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Catalogue entry for a single shop.
///
/// `price` is the listed price (MRP). `cost_price` is what the shop paid and
/// is never exposed to customers; `min_price` is the bargaining floor below
/// which a sale needs an explicit override.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub shop_id: Option<ShopId>,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub quantity: u32,
    pub sold_count: u32,
    pub min_stock_level: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock_level
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{Product, ProductId};

    fn product(quantity: u32, min_stock_level: u32) -> Product {
        Product {
            id: ProductId(1),
            shop_id: None,
            name: "Basmati Rice 5kg".to_string(),
            description: None,
            sku: Some("RICE-5KG".to_string()),
            price: Decimal::new(60_000, 2),
            cost_price: Some(Decimal::new(40_000, 2)),
            min_price: None,
            quantity,
            sold_count: 0,
            min_stock_level,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_when_quantity_at_or_below_threshold() {
        assert!(product(5, 5).is_low_stock());
        assert!(product(0, 5).is_low_stock());
        assert!(!product(6, 5).is_low_stock());
    }
}
