use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::Order;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillView {
    Customer,
    Admin,
}

impl BillView {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "customer" => Some(Self::Customer),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BillCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Customer-facing bill. Cost and profit fields do not exist on this type at
/// all, so no serialization path can leak them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerBill {
    pub bill_type: &'static str,
    pub order_id: i64,
    pub shop_name: String,
    pub date: String,
    pub items: Vec<CustomerBillLine>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
    pub customer: BillCustomer,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerBillLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// Admin-facing bill with the full profit breakdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdminBill {
    pub bill_type: &'static str,
    pub order_id: i64,
    pub shop_name: String,
    pub date: String,
    pub items: Vec<AdminBillLine>,
    pub summary: AdminBillSummary,
    pub customer: BillCustomer,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdminBillLine {
    pub name: String,
    pub quantity: u32,
    pub cost_price: Option<Decimal>,
    pub mrp: Decimal,
    pub sold_at: Decimal,
    pub total_cost: Option<Decimal>,
    pub total_revenue: Decimal,
    pub profit: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdminBillSummary {
    pub subtotal: Decimal,
    pub total_cost: Option<Decimal>,
    pub total_profit: Option<Decimal>,
    pub discount_given: Decimal,
    pub profit_margin_percent: Decimal,
}

fn bill_customer(order: &Order) -> BillCustomer {
    BillCustomer {
        name: order.customer_name.clone(),
        phone: order.customer_phone.clone(),
        email: order.customer_email.clone(),
    }
}

fn bill_date(order: &Order) -> String {
    order.created_at.format("%Y-%m-%d %H:%M").to_string()
}

pub fn customer_bill(order: &Order, shop_name: impl Into<String>) -> CustomerBill {
    CustomerBill {
        bill_type: "customer",
        order_id: order.id.0,
        shop_name: shop_name.into(),
        date: bill_date(order),
        items: vec![CustomerBillLine {
            name: order.product_name.clone(),
            quantity: order.quantity,
            unit_price: order.pricing.unit_price,
            total: order.pricing.total_amount,
        }],
        subtotal: order.pricing.total_amount,
        tax: Decimal::ZERO,
        grand_total: order.pricing.total_amount,
        customer: bill_customer(order),
        status: order.status.to_string(),
    }
}

pub fn admin_bill(order: &Order, shop_name: impl Into<String>) -> AdminBill {
    let pricing = &order.pricing;

    let profit_margin_percent = match (pricing.profit, pricing.total_cost) {
        (Some(profit), Some(total_cost)) if total_cost > Decimal::ZERO => {
            (profit / total_cost * Decimal::ONE_HUNDRED).round_dp(2)
        }
        _ => Decimal::ZERO,
    };

    AdminBill {
        bill_type: "admin",
        order_id: order.id.0,
        shop_name: shop_name.into(),
        date: bill_date(order),
        items: vec![AdminBillLine {
            name: order.product_name.clone(),
            quantity: order.quantity,
            cost_price: pricing.cost_price,
            mrp: pricing.listed_price,
            sold_at: pricing.final_price,
            total_cost: pricing.total_cost,
            total_revenue: pricing.total_amount,
            profit: pricing.profit,
        }],
        summary: AdminBillSummary {
            subtotal: pricing.total_amount,
            total_cost: pricing.total_cost,
            total_profit: pricing.profit,
            discount_given: pricing.discount_given,
            profit_margin_percent,
        },
        customer: bill_customer(order),
        status: order.status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::billing::pricing::PricingSnapshot;
    use crate::domain::order::{Order, OrderId, OrderStatus};
    use crate::domain::product::ProductId;

    use super::{admin_bill, customer_bill, BillView};

    fn order() -> Order {
        Order {
            id: OrderId(42),
            shop_id: None,
            product_id: Some(ProductId(5)),
            product_name: "Pressure Cooker".to_string(),
            quantity: 2,
            pricing: PricingSnapshot {
                cost_price: Some(Decimal::new(50_000, 2)),
                listed_price: Decimal::new(80_000, 2),
                final_price: Decimal::new(70_000, 2),
                unit_price: Decimal::new(70_000, 2),
                total_amount: Decimal::new(140_000, 2),
                total_cost: Some(Decimal::new(100_000, 2)),
                profit: Some(Decimal::new(40_000, 2)),
                discount_given: Decimal::new(20_000, 2),
            },
            status: OrderStatus::Pending,
            customer_name: "Meera".to_string(),
            customer_email: None,
            customer_phone: Some("9876543210".to_string()),
            delivery_address: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn customer_bill_json_never_contains_cost_or_profit_keys() {
        let bill = customer_bill(&order(), "Sharma General Store");
        let rendered = serde_json::to_string(&bill).expect("serialize customer bill");

        assert!(!rendered.contains("cost_price"));
        assert!(!rendered.contains("profit"));
        assert!(!rendered.contains("total_cost"));
        assert!(rendered.contains("\"grand_total\""));
    }

    #[test]
    fn admin_bill_profit_equals_revenue_minus_cost() {
        let bill = admin_bill(&order(), "Sharma General Store");
        let summary = &bill.summary;

        assert_eq!(
            summary.total_profit,
            Some(summary.subtotal - summary.total_cost.expect("cost known"))
        );
        assert_eq!(summary.profit_margin_percent, Decimal::new(4_000, 2));
    }

    #[test]
    fn margin_is_zero_when_cost_is_unknown() {
        let mut order = order();
        order.pricing.cost_price = None;
        order.pricing.total_cost = None;
        order.pricing.profit = None;

        let bill = admin_bill(&order, "Sharma General Store");
        assert_eq!(bill.summary.profit_margin_percent, Decimal::ZERO);
        assert_eq!(bill.summary.total_profit, None);
    }

    #[test]
    fn bill_view_parses_case_insensitively() {
        assert_eq!(BillView::parse("Admin"), Some(BillView::Admin));
        assert_eq!(BillView::parse("customer"), Some(BillView::Customer));
        assert_eq!(BillView::parse("internal"), None);
    }
}
