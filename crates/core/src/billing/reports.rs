use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::order::{Order, OrderStatus};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProfitReport {
    pub date: String,
    pub total_orders: usize,
    pub total_revenue: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub total_discount_given: Decimal,
    pub avg_profit_margin: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductProfitEntry {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub units_sold: u64,
    pub total_revenue: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub avg_selling_price: Decimal,
    pub avg_profit_per_unit: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitStats {
    pub orders: usize,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub discount_given: Decimal,
    pub margin_percent: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopProfitSummary {
    pub today: ProfitStats,
    pub all_time: ProfitStats,
}

fn countable(order: &Order) -> bool {
    order.status != OrderStatus::Cancelled
}

fn margin(profit: Decimal, cost: Decimal) -> Decimal {
    if cost > Decimal::ZERO {
        (profit / cost * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    }
}

fn stats(orders: &[&Order]) -> ProfitStats {
    let mut revenue = Decimal::ZERO;
    let mut cost = Decimal::ZERO;
    let mut profit = Decimal::ZERO;
    let mut discount = Decimal::ZERO;

    for order in orders {
        revenue += order.pricing.total_amount;
        cost += order.pricing.total_cost.unwrap_or(Decimal::ZERO);
        profit += order.pricing.profit.unwrap_or(Decimal::ZERO);
        discount += order.pricing.discount_given;
    }

    ProfitStats {
        orders: orders.len(),
        revenue: revenue.round_dp(2),
        cost: cost.round_dp(2),
        profit: profit.round_dp(2),
        discount_given: discount.round_dp(2),
        margin_percent: margin(profit, cost),
    }
}

/// Revenue/cost/profit/discount totals for one calendar day. Cancelled
/// orders are excluded; margin is guarded against a zero-cost denominator.
pub fn daily_profit(orders: &[Order], report_date: NaiveDate) -> DailyProfitReport {
    let day: Vec<&Order> = orders
        .iter()
        .filter(|order| countable(order) && order.created_at.date_naive() == report_date)
        .collect();
    let stats = stats(&day);

    DailyProfitReport {
        date: report_date.format("%Y-%m-%d").to_string(),
        total_orders: stats.orders,
        total_revenue: stats.revenue,
        total_cost: stats.cost,
        total_profit: stats.profit,
        total_discount_given: stats.discount_given,
        avg_profit_margin: stats.margin_percent,
    }
}

/// Per-product totals across all non-cancelled orders, sorted by profit
/// descending.
pub fn profit_by_product(orders: &[Order]) -> Vec<ProductProfitEntry> {
    let mut grouped: BTreeMap<(Option<i64>, String), (u64, Decimal, Decimal, Decimal)> =
        BTreeMap::new();

    for order in orders.iter().filter(|order| countable(order)) {
        let key = (order.product_id.map(|id| id.0), order.product_name.clone());
        let entry = grouped.entry(key).or_insert((0, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO));
        entry.0 += u64::from(order.quantity);
        entry.1 += order.pricing.total_amount;
        entry.2 += order.pricing.total_cost.unwrap_or(Decimal::ZERO);
        entry.3 += order.pricing.profit.unwrap_or(Decimal::ZERO);
    }

    let mut entries: Vec<ProductProfitEntry> = grouped
        .into_iter()
        .map(|((product_id, product_name), (units, revenue, cost, profit))| {
            let unit_divisor = Decimal::from(units.max(1));
            ProductProfitEntry {
                product_id,
                product_name,
                units_sold: units,
                total_revenue: revenue.round_dp(2),
                total_cost: cost.round_dp(2),
                total_profit: profit.round_dp(2),
                avg_selling_price: if units > 0 {
                    (revenue / unit_divisor).round_dp(2)
                } else {
                    Decimal::ZERO
                },
                avg_profit_per_unit: if units > 0 {
                    (profit / unit_divisor).round_dp(2)
                } else {
                    Decimal::ZERO
                },
            }
        })
        .collect();

    entries.sort_by(|a, b| b.total_profit.cmp(&a.total_profit));
    entries
}

/// Today-vs-all-time dashboard block.
pub fn shop_profit_summary(orders: &[Order], today: NaiveDate) -> ShopProfitSummary {
    let all: Vec<&Order> = orders.iter().filter(|order| countable(order)).collect();
    let todays: Vec<&Order> =
        all.iter().copied().filter(|order| order.created_at.date_naive() == today).collect();

    ShopProfitSummary { today: stats(&todays), all_time: stats(&all) }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::billing::pricing::PricingSnapshot;
    use crate::domain::order::{Order, OrderId, OrderStatus};
    use crate::domain::product::ProductId;

    use super::{daily_profit, profit_by_product, shop_profit_summary};

    fn rupees(value: i64) -> Decimal {
        Decimal::new(value * 100, 2)
    }

    fn order(
        id: i64,
        product_id: i64,
        name: &str,
        quantity: u32,
        unit_price: i64,
        unit_cost: Option<i64>,
        status: OrderStatus,
        days_ago: i64,
    ) -> Order {
        let qty = Decimal::from(quantity);
        let total_amount = rupees(unit_price) * qty;
        let total_cost = unit_cost.map(|cost| rupees(cost) * qty);
        Order {
            id: OrderId(id),
            shop_id: None,
            product_id: Some(ProductId(product_id)),
            product_name: name.to_string(),
            quantity,
            pricing: PricingSnapshot {
                cost_price: unit_cost.map(rupees),
                listed_price: rupees(unit_price),
                final_price: rupees(unit_price),
                unit_price: rupees(unit_price),
                total_amount,
                total_cost,
                profit: total_cost.map(|cost| total_amount - cost),
                discount_given: Decimal::ZERO,
            },
            status,
            customer_name: "Walk-in Customer".to_string(),
            customer_email: None,
            customer_phone: None,
            delivery_address: None,
            created_at: Utc.with_ymd_and_hms(2026, 8, 6, 10, 0, 0).unwrap()
                - Duration::days(days_ago),
        }
    }

    fn report_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    #[test]
    fn daily_report_excludes_cancelled_and_other_days() {
        let orders = vec![
            order(1, 1, "Rice", 2, 60, Some(40), OrderStatus::Pending, 0),
            order(2, 1, "Rice", 1, 60, Some(40), OrderStatus::Cancelled, 0),
            order(3, 2, "Dal", 1, 90, Some(70), OrderStatus::Delivered, 1),
        ];

        let report = daily_profit(&orders, report_day());
        assert_eq!(report.total_orders, 1);
        assert_eq!(report.total_revenue, rupees(120));
        assert_eq!(report.total_cost, rupees(80));
        assert_eq!(report.total_profit, rupees(40));
        assert_eq!(report.avg_profit_margin, Decimal::new(5_000, 2));
    }

    #[test]
    fn daily_report_margin_guards_zero_cost() {
        let orders = vec![order(1, 1, "Loose Jaggery", 3, 50, None, OrderStatus::Pending, 0)];
        let report = daily_profit(&orders, report_day());
        assert_eq!(report.total_cost, Decimal::ZERO);
        assert_eq!(report.avg_profit_margin, Decimal::ZERO);
    }

    #[test]
    fn product_report_groups_and_sorts_by_profit() {
        let orders = vec![
            order(1, 1, "Rice", 2, 60, Some(40), OrderStatus::Pending, 0),
            order(2, 1, "Rice", 3, 60, Some(40), OrderStatus::Delivered, 2),
            order(3, 2, "Ghee", 1, 500, Some(350), OrderStatus::Pending, 0),
        ];

        let entries = profit_by_product(&orders);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].product_name, "Ghee");
        assert_eq!(entries[0].total_profit, rupees(150));
        assert_eq!(entries[1].units_sold, 5);
        assert_eq!(entries[1].avg_selling_price, rupees(60));
        assert_eq!(entries[1].avg_profit_per_unit, rupees(20));
    }

    #[test]
    fn summary_splits_today_from_all_time() {
        let orders = vec![
            order(1, 1, "Rice", 1, 60, Some(40), OrderStatus::Pending, 0),
            order(2, 1, "Rice", 1, 60, Some(40), OrderStatus::Pending, 5),
        ];

        let summary = shop_profit_summary(&orders, report_day());
        assert_eq!(summary.today.orders, 1);
        assert_eq!(summary.all_time.orders, 2);
        assert_eq!(summary.all_time.profit, rupees(40));
        assert_eq!(summary.today.margin_percent, Decimal::new(5_000, 2));
    }
}
