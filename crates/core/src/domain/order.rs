use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::pricing::PricingSnapshot;
use crate::domain::product::ProductId;
use crate::domain::shop::ShopId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub i64);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed sale. The pricing snapshot is fixed at creation time; profit
/// reports are derived from stored snapshots, never re-priced from the
/// current product state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub shop_id: Option<ShopId>,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: u32,
    pub pricing: PricingSnapshot,
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self.status, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Pending, OrderStatus::Shipped)
                | (OrderStatus::Confirmed, OrderStatus::Shipped)
                | (OrderStatus::Confirmed, OrderStatus::Delivered)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Confirmed, OrderStatus::Cancelled)
                | (OrderStatus::Pending, OrderStatus::Refunded)
                | (OrderStatus::Confirmed, OrderStatus::Refunded)
                | (OrderStatus::Shipped, OrderStatus::Refunded)
                | (OrderStatus::Delivered, OrderStatus::Refunded)
        )
    }

    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidOrderTransition { from: self.status, to: next })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::billing::pricing::PricingSnapshot;
    use crate::domain::product::ProductId;

    use super::{Order, OrderId, OrderStatus};

    fn order(status: OrderStatus) -> Order {
        Order {
            id: OrderId(1),
            shop_id: None,
            product_id: Some(ProductId(7)),
            product_name: "Dettol Soap".to_string(),
            quantity: 2,
            pricing: PricingSnapshot {
                cost_price: Some(Decimal::new(2_000, 2)),
                listed_price: Decimal::new(3_500, 2),
                final_price: Decimal::new(3_000, 2),
                unit_price: Decimal::new(3_000, 2),
                total_amount: Decimal::new(6_000, 2),
                total_cost: Some(Decimal::new(4_000, 2)),
                profit: Some(Decimal::new(2_000, 2)),
                discount_given: Decimal::new(1_000, 2),
            },
            status,
            customer_name: "Walk-in Customer".to_string(),
            customer_email: None,
            customer_phone: None,
            delivery_address: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn allows_pending_to_confirmed_to_delivered() {
        let mut order = order(OrderStatus::Pending);
        order.transition_to(OrderStatus::Confirmed).expect("pending -> confirmed");
        order.transition_to(OrderStatus::Shipped).expect("confirmed -> shipped");
        order.transition_to(OrderStatus::Delivered).expect("shipped -> delivered");
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn blocks_cancelling_a_shipped_order() {
        let mut order = order(OrderStatus::Shipped);
        let error =
            order.transition_to(OrderStatus::Cancelled).expect_err("shipped -> cancelled fails");
        assert!(matches!(error, crate::errors::DomainError::InvalidOrderTransition { .. }));
        assert_eq!(order.status, OrderStatus::Shipped);
    }

    #[test]
    fn delivered_orders_can_still_be_refunded() {
        let mut order = order(OrderStatus::Delivered);
        order.transition_to(OrderStatus::Refunded).expect("delivered -> refunded");
        assert_eq!(order.status, OrderStatus::Refunded);
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("canceled"), Some(OrderStatus::Cancelled));
        assert_eq!(OrderStatus::parse("unknown"), None);
    }
}
