use chrono::{NaiveDate, Utc};
use serde_json::json;

use kirana_core::billing::bills::{admin_bill, customer_bill, BillView};
use kirana_core::billing::pricing::{price_sale, SaleRejection};
use kirana_core::billing::reports::{daily_profit, profit_by_product, shop_profit_summary};
use kirana_core::catalog::SellAtPrice;
use kirana_core::command::CommandResult;
use kirana_core::domain::order::{Order, OrderId};
use kirana_core::domain::product::ProductId;
use kirana_core::domain::shop::ShopId;
use kirana_core::stores::{NewOrder, OrderFilter};

use super::{store_failure, ActionExecutor};

impl ActionExecutor {
    pub(super) async fn sell_at_price(&self, payload: SellAtPrice) -> CommandResult {
        let product = match self.products().get(ProductId(payload.product_id)).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                return CommandResult::fail(
                    "sell_at_price",
                    format!("Product {} not found", payload.product_id),
                );
            }
            Err(error) => return store_failure("sell_at_price", error),
        };

        let pricing =
            match price_sale(&product, payload.quantity, Some(payload.price), payload.force) {
                Ok(pricing) => pricing,
                // Floor and loss rejections are soft: surfaced as a
                // confirmation-required outcome the caller retries with force.
                Err(rejection) => {
                    let message = rejection.to_string();
                    return match rejection {
                        SaleRejection::InsufficientStock { .. } => {
                            CommandResult::fail("sell_at_price", message)
                        }
                        SaleRejection::BelowMinPrice { min_price, .. } => {
                            CommandResult::policy_rejection(
                                "sell_at_price",
                                message,
                                json!({
                                    "confirmation_type": "below_min_price",
                                    "min_price": min_price,
                                }),
                            )
                        }
                        SaleRejection::SellingAtLoss { loss_per_unit, .. } => {
                            CommandResult::policy_rejection(
                                "sell_at_price",
                                message,
                                json!({
                                    "confirmation_type": "selling_at_loss",
                                    "loss_per_unit": loss_per_unit,
                                }),
                            )
                        }
                    };
                }
            };

        let order = NewOrder {
            shop_id: product.shop_id,
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: payload.quantity,
            pricing,
            customer_name: payload.customer_name,
            customer_email: None,
            customer_phone: payload.customer_phone,
            delivery_address: None,
        };

        match self.orders().create_priced(order).await {
            Ok(order) => {
                let message = match order.pricing.profit {
                    Some(profit) => format!(
                        "Sale completed! Order #{} - Sold at ₹{} (Profit: ₹{profit})",
                        order.id, order.pricing.final_price
                    ),
                    None => format!(
                        "Sale completed! Order #{} - Sold at ₹{}",
                        order.id, order.pricing.final_price
                    ),
                };

                CommandResult::ok_with_data(
                    "sell_at_price",
                    message,
                    json!({
                        "order_id": order.id.0,
                        "product": order.product_name,
                        "quantity": order.quantity,
                        "cost_price": order.pricing.cost_price,
                        "listed_price": order.pricing.listed_price,
                        "sold_at": order.pricing.final_price,
                        "profit": order.pricing.profit,
                        "discount_given": order.pricing.discount_given,
                    }),
                )
            }
            Err(error) => store_failure("sell_at_price", error),
        }
    }

    pub(super) async fn generate_bill(&self, order_id: i64, view: BillView) -> CommandResult {
        let order = match self.orders().get(OrderId(order_id)).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                return CommandResult::fail(
                    "generate_bill",
                    format!("Order {order_id} not found"),
                );
            }
            Err(error) => return store_failure("generate_bill", error),
        };

        let shop_name = self.shop_name_for(&order).await;

        let bill = match view {
            BillView::Customer => serde_json::to_value(customer_bill(&order, shop_name)),
            BillView::Admin => serde_json::to_value(admin_bill(&order, shop_name)),
        };

        match bill {
            Ok(bill) => CommandResult::ok_with_data(
                "generate_bill",
                format!("Generated {} bill for Order #{order_id}", view.as_str()),
                bill,
            ),
            Err(error) => CommandResult::fail("generate_bill", error.to_string()),
        }
    }

    pub(super) async fn get_daily_profit(
        &self,
        shop_id: i64,
        date: Option<NaiveDate>,
    ) -> CommandResult {
        let report_date = date.unwrap_or_else(|| Utc::now().date_naive());

        let orders = match self.orders().list_for_day(Some(ShopId(shop_id)), report_date).await {
            Ok(orders) => orders,
            Err(error) => return store_failure("get_daily_profit", error),
        };

        let report = daily_profit(&orders, report_date);
        match serde_json::to_value(&report) {
            Ok(data) => CommandResult::ok_with_data(
                "get_daily_profit",
                format!(
                    "Profit Report for {}: Revenue ₹{}, Profit ₹{} ({}% margin)",
                    report.date, report.total_revenue, report.total_profit,
                    report.avg_profit_margin
                ),
                data,
            ),
            Err(error) => CommandResult::fail("get_daily_profit", error.to_string()),
        }
    }

    pub(super) async fn get_product_profit(&self, shop_id: i64) -> CommandResult {
        let orders = match self
            .orders()
            .list(OrderFilter { shop_id: Some(ShopId(shop_id)), ..OrderFilter::default() })
            .await
        {
            Ok(orders) => orders,
            Err(error) => return store_failure("get_product_profit", error),
        };

        let products = profit_by_product(&orders);
        let total_profit: rust_decimal::Decimal =
            products.iter().map(|entry| entry.total_profit).sum();

        CommandResult::ok_with_data(
            "get_product_profit",
            format!(
                "Product Profit Report: {} products, Total Profit ₹{total_profit}",
                products.len()
            ),
            json!({"products": products, "total_profit": total_profit}),
        )
    }

    pub(super) async fn get_profit_summary(&self, shop_id: i64) -> CommandResult {
        let orders = match self
            .orders()
            .list(OrderFilter { shop_id: Some(ShopId(shop_id)), ..OrderFilter::default() })
            .await
        {
            Ok(orders) => orders,
            Err(error) => return store_failure("get_profit_summary", error),
        };

        let summary = shop_profit_summary(&orders, Utc::now().date_naive());
        match serde_json::to_value(&summary) {
            Ok(data) => CommandResult::ok_with_data(
                "get_profit_summary",
                format!(
                    "Today: ₹{} profit ({} orders) | All Time: ₹{} profit",
                    summary.today.profit, summary.today.orders, summary.all_time.profit
                ),
                data,
            ),
            Err(error) => CommandResult::fail("get_profit_summary", error.to_string()),
        }
    }

    async fn shop_name_for(&self, order: &Order) -> String {
        match order.shop_id {
            Some(shop_id) => match self.shops().get(shop_id).await {
                Ok(Some(shop)) => shop.name,
                _ => "Shop".to_string(),
            },
            None => "Shop".to_string(),
        }
    }
}
