use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::Product;

/// Immutable pricing breakdown embedded in an order at creation time.
///
/// `cost_price`, `total_cost`, and `profit` stay `None` when the product's
/// cost is unknown; the admin bill and reports guard against that.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub cost_price: Option<Decimal>,
    pub listed_price: Decimal,
    pub final_price: Decimal,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub total_cost: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub discount_given: Decimal,
}

/// Why a proposed sale was refused.
///
/// `BelowMinPrice` and `SellingAtLoss` are soft failures: the caller can
/// retry with the `force` override after explicit confirmation.
/// `InsufficientStock` is a hard failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SaleRejection {
    #[error("Not enough stock. Available: {available}, Requested: {requested}")]
    InsufficientStock { available: u32, requested: u32 },
    #[error("Price ₹{proposed} is below minimum acceptable price ₹{min_price}")]
    BelowMinPrice { proposed: Decimal, min_price: Decimal },
    #[error("Selling at ₹{proposed} results in loss of ₹{loss_per_unit}/unit")]
    SellingAtLoss { proposed: Decimal, loss_per_unit: Decimal },
}

impl SaleRejection {
    pub fn requires_confirmation(&self) -> bool {
        !matches!(self, Self::InsufficientStock { .. })
    }

    pub fn confirmation_type(&self) -> Option<&'static str> {
        match self {
            Self::InsufficientStock { .. } => None,
            Self::BelowMinPrice { .. } => Some("below_min_price"),
            Self::SellingAtLoss { .. } => Some("selling_at_loss"),
        }
    }
}

/// Price a proposed sale against the product's floor policies.
///
/// The listed price is the product's MRP; the final price is the bargained
/// price when one is proposed. Policy checks are skipped under `force`, the
/// explicit loss/floor override. Stock is checked here so callers get a
/// rejection before any side effect; the store re-checks atomically when the
/// order commits.
pub fn price_sale(
    product: &Product,
    quantity: u32,
    proposed_price: Option<Decimal>,
    force: bool,
) -> Result<PricingSnapshot, SaleRejection> {
    if product.quantity < quantity {
        return Err(SaleRejection::InsufficientStock {
            available: product.quantity,
            requested: quantity,
        });
    }

    let listed_price = product.price;
    let final_price = proposed_price.unwrap_or(listed_price);

    if !force {
        if let Some(min_price) = product.min_price {
            if final_price < min_price {
                return Err(SaleRejection::BelowMinPrice { proposed: final_price, min_price });
            }
        }
        if let Some(cost_price) = product.cost_price {
            if cost_price > Decimal::ZERO && final_price < cost_price {
                return Err(SaleRejection::SellingAtLoss {
                    proposed: final_price,
                    loss_per_unit: cost_price - final_price,
                });
            }
        }
    }

    let qty = Decimal::from(quantity);
    let total_amount = final_price * qty;
    let total_cost = product.cost_price.map(|cost| cost * qty);
    let profit = total_cost.map(|cost| total_amount - cost);
    let discount_given = (listed_price - final_price) * qty;

    Ok(PricingSnapshot {
        cost_price: product.cost_price,
        listed_price,
        final_price,
        unit_price: final_price,
        total_amount,
        total_cost,
        profit,
        discount_given,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::domain::product::{Product, ProductId};

    use super::{price_sale, SaleRejection};

    fn rupees(value: i64) -> Decimal {
        Decimal::new(value * 100, 2)
    }

    fn product(price: i64, cost: Option<i64>, min_price: Option<i64>, quantity: u32) -> Product {
        Product {
            id: ProductId(1),
            shop_id: None,
            name: "Ceiling Fan".to_string(),
            description: None,
            sku: None,
            price: rupees(price),
            cost_price: cost.map(rupees),
            min_price: min_price.map(rupees),
            quantity,
            sold_count: 0,
            min_stock_level: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn uses_listed_price_when_no_bargain_given() {
        let snapshot = price_sale(&product(120, Some(80), None, 10), 3, None, false)
            .expect("sale at mrp should price");

        assert_eq!(snapshot.final_price, rupees(120));
        assert_eq!(snapshot.total_amount, rupees(360));
        assert_eq!(snapshot.total_cost, Some(rupees(240)));
        assert_eq!(snapshot.profit, Some(rupees(120)));
        assert_eq!(snapshot.discount_given, Decimal::ZERO);
    }

    #[test]
    fn bargained_price_records_discount_and_profit() {
        let snapshot = price_sale(&product(150, Some(70), Some(90), 100), 2, Some(rupees(100)), false)
            .expect("bargain above floor should price");

        assert_eq!(snapshot.final_price, rupees(100));
        assert_eq!(snapshot.unit_price, rupees(100));
        assert_eq!(snapshot.total_amount, rupees(200));
        assert_eq!(snapshot.profit, Some(rupees(60)));
        assert_eq!(snapshot.discount_given, rupees(100));
    }

    #[test]
    fn below_min_price_is_a_soft_failure() {
        let rejection = price_sale(&product(150, Some(80), Some(100), 10), 1, Some(rupees(90)), false)
            .expect_err("below floor must reject");

        assert_eq!(
            rejection,
            SaleRejection::BelowMinPrice { proposed: rupees(90), min_price: rupees(100) }
        );
        assert!(rejection.requires_confirmation());
        assert_eq!(rejection.confirmation_type(), Some("below_min_price"));
    }

    #[test]
    fn below_min_price_proceeds_under_force() {
        let snapshot = price_sale(&product(150, Some(80), Some(100), 10), 1, Some(rupees(90)), true)
            .expect("force overrides the floor");
        assert_eq!(snapshot.final_price, rupees(90));
        assert_eq!(snapshot.profit, Some(rupees(10)));
    }

    #[test]
    fn selling_at_loss_reports_per_unit_loss() {
        let rejection = price_sale(&product(120, Some(100), None, 10), 1, Some(rupees(80)), false)
            .expect_err("below cost must reject");

        assert_eq!(
            rejection,
            SaleRejection::SellingAtLoss { proposed: rupees(80), loss_per_unit: rupees(20) }
        );
        assert_eq!(rejection.confirmation_type(), Some("selling_at_loss"));
    }

    #[test]
    fn unknown_cost_skips_loss_check_and_profit() {
        let snapshot = price_sale(&product(120, None, None, 10), 2, Some(rupees(10)), false)
            .expect("no cost means no loss check");
        assert_eq!(snapshot.total_cost, None);
        assert_eq!(snapshot.profit, None);
        assert_eq!(snapshot.discount_given, rupees(220));
    }

    #[test]
    fn insufficient_stock_is_a_hard_failure() {
        let rejection = price_sale(&product(120, Some(80), None, 1), 5, None, false)
            .expect_err("short stock must reject");
        assert_eq!(rejection, SaleRejection::InsufficientStock { available: 1, requested: 5 });
        assert!(!rejection.requires_confirmation());
        assert_eq!(rejection.confirmation_type(), None);
    }

    #[test]
    fn force_does_not_override_stock() {
        let rejection = price_sale(&product(120, Some(80), None, 1), 5, None, true)
            .expect_err("force is a policy override, not a stock override");
        assert!(matches!(rejection, SaleRejection::InsufficientStock { .. }));
    }
}
