use serde_json::{json, Value};

use kirana_core::billing::pricing::{price_sale, SaleRejection};
use kirana_core::catalog::PlaceOrder;
use kirana_core::command::CommandResult;
use kirana_core::domain::order::{Order, OrderId, OrderStatus};
use kirana_core::domain::product::ProductId;
use kirana_core::stores::{NewOrder, OrderFilter};

use super::{store_failure, ActionExecutor};

fn order_row(order: &Order) -> Value {
    json!({
        "id": order.id.0,
        "status": order.status,
        "total": order.pricing.total_amount,
        "customer": order.customer_name,
        "product_name": order.product_name,
        "unit_price": order.pricing.unit_price,
        "quantity": order.quantity,
    })
}

impl ActionExecutor {
    pub(super) async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        shop_id: Option<i64>,
    ) -> CommandResult {
        let filter = OrderFilter {
            shop_id: shop_id.map(kirana_core::domain::shop::ShopId),
            status,
            customer_email: None,
        };

        match self.orders().list(filter).await {
            Ok(orders) => CommandResult::ok_with_data(
                "list_orders",
                format!("Found {} orders", orders.len()),
                Value::Array(orders.iter().map(order_row).collect()),
            ),
            Err(error) => store_failure("list_orders", error),
        }
    }

    pub(super) async fn get_order(&self, order_id: i64) -> CommandResult {
        match self.orders().get(OrderId(order_id)).await {
            Ok(Some(order)) => CommandResult::ok_with_data(
                "get_order",
                format!("Found order #{}", order.id),
                order_row(&order),
            ),
            Ok(None) => CommandResult::fail("get_order", format!("Order {order_id} not found")),
            Err(error) => store_failure("get_order", error),
        }
    }

    async fn transition_order(
        &self,
        action: &'static str,
        order_id: i64,
        next: OrderStatus,
        describe: impl FnOnce(&Order) -> String,
    ) -> CommandResult {
        let order = match self.orders().get(OrderId(order_id)).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                return CommandResult::fail(action, format!("Order {order_id} not found"));
            }
            Err(error) => return store_failure(action, error),
        };

        if !order.can_transition_to(next) {
            return CommandResult::fail(
                action,
                format!(
                    "Order {order_id} cannot be {}. Current status: {}",
                    past_tense(next),
                    order.status
                ),
            );
        }

        match self.orders().set_status(order.id, next).await {
            Ok(Some(updated)) => {
                let message = describe(&updated);
                CommandResult::ok_with_data(action, message, order_row(&updated))
            }
            Ok(None) => CommandResult::fail(action, format!("Order {order_id} not found")),
            Err(error) => store_failure(action, error),
        }
    }

    pub(super) async fn confirm_order(&self, order_id: i64) -> CommandResult {
        self.transition_order("confirm_order", order_id, OrderStatus::Confirmed, |order| {
            format!("Order #{} has been confirmed", order.id)
        })
        .await
    }

    pub(super) async fn ship_order(
        &self,
        order_id: i64,
        tracking_number: Option<String>,
    ) -> CommandResult {
        self.transition_order("ship_order", order_id, OrderStatus::Shipped, |order| {
            match &tracking_number {
                Some(tracking) => {
                    format!("Order #{} has been marked as shipped (Tracking: {tracking})", order.id)
                }
                None => format!("Order #{} has been marked as shipped", order.id),
            }
        })
        .await
    }

    pub(super) async fn deliver_order(&self, order_id: i64) -> CommandResult {
        self.transition_order("deliver_order", order_id, OrderStatus::Delivered, |order| {
            format!("Order #{} has been delivered to {}", order.id, order.customer_name)
        })
        .await
    }

    pub(super) async fn cancel_order(&self, order_id: i64) -> CommandResult {
        let order = match self.orders().get(OrderId(order_id)).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                return CommandResult::fail(
                    "cancel_order",
                    format!(
                        "Cannot cancel order {order_id}. It may not exist or has already been shipped."
                    ),
                );
            }
            Err(error) => return store_failure("cancel_order", error),
        };

        if !order.can_transition_to(OrderStatus::Cancelled) {
            return CommandResult::fail(
                "cancel_order",
                format!(
                    "Cannot cancel order {order_id}. It may not exist or has already been shipped."
                ),
            );
        }

        match self.orders().set_status(order.id, OrderStatus::Cancelled).await {
            Ok(Some(updated)) => CommandResult::ok_with_data(
                "cancel_order",
                format!("Cancelled order #{}", updated.id),
                json!({"id": updated.id.0, "status": updated.status}),
            ),
            Ok(None) => CommandResult::fail("cancel_order", format!("Order {order_id} not found")),
            Err(error) => store_failure("cancel_order", error),
        }
    }

    pub(super) async fn refund_order(
        &self,
        order_id: i64,
        reason: Option<String>,
    ) -> CommandResult {
        let order = match self.orders().get(OrderId(order_id)).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                return CommandResult::fail("refund_order", format!("Order {order_id} not found"));
            }
            Err(error) => return store_failure("refund_order", error),
        };

        if order.status == OrderStatus::Refunded {
            return CommandResult::fail(
                "refund_order",
                format!("Order {order_id} has already been refunded"),
            );
        }
        if !order.can_transition_to(OrderStatus::Refunded) {
            return CommandResult::fail(
                "refund_order",
                format!("Order {order_id} cannot be refunded. Current status: {}", order.status),
            );
        }

        let reason = reason.unwrap_or_else(|| "Customer request".to_string());
        match self.orders().set_status(order.id, OrderStatus::Refunded).await {
            Ok(Some(updated)) => CommandResult::ok_with_data(
                "refund_order",
                format!("Order #{} has been refunded. Reason: {reason}", updated.id),
                json!({
                    "id": updated.id.0,
                    "status": updated.status,
                    "amount": updated.pricing.total_amount,
                    "reason": reason,
                }),
            ),
            Ok(None) => CommandResult::fail("refund_order", format!("Order {order_id} not found")),
            Err(error) => store_failure("refund_order", error),
        }
    }

    pub(super) async fn place_order(&self, payload: PlaceOrder) -> CommandResult {
        let product = match self.products().get(ProductId(payload.product_id)).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                return CommandResult::fail(
                    "place_order",
                    format!("Product {} not found", payload.product_id),
                );
            }
            Err(error) => return store_failure("place_order", error),
        };

        // Customer orders always go at the listed price, so only the stock
        // check can reject here.
        let pricing = match price_sale(&product, payload.quantity, None, false) {
            Ok(pricing) => pricing,
            Err(SaleRejection::InsufficientStock { available, requested }) => {
                return CommandResult::fail(
                    "place_order",
                    format!("Not enough stock. Available: {available}, Requested: {requested}"),
                );
            }
            Err(rejection) => return CommandResult::fail("place_order", rejection.to_string()),
        };

        let order = NewOrder {
            shop_id: product.shop_id,
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: payload.quantity,
            pricing,
            customer_name: payload.customer_name.unwrap_or_else(|| "Customer".to_string()),
            customer_email: payload.customer_email,
            customer_phone: None,
            delivery_address: None,
        };

        match self.orders().create_priced(order).await {
            Ok(order) => CommandResult::ok_with_data(
                "place_order",
                format!(
                    "Order placed successfully! Order #{} for {}x {}",
                    order.id, order.quantity, order.product_name
                ),
                json!({
                    "id": order.id.0,
                    "product": order.product_name,
                    "quantity": order.quantity,
                    "total": order.pricing.total_amount,
                    "status": order.status,
                }),
            ),
            Err(error) => store_failure("place_order", error),
        }
    }

    pub(super) async fn list_my_orders(&self, customer_email: Option<String>) -> CommandResult {
        let filter = OrderFilter { shop_id: None, status: None, customer_email };

        match self.orders().list(filter).await {
            Ok(orders) => CommandResult::ok_with_data(
                "list_my_orders",
                format!("Found {} orders", orders.len()),
                Value::Array(
                    orders
                        .iter()
                        .map(|order| {
                            json!({
                                "id": order.id.0,
                                "product": order.product_name,
                                "quantity": order.quantity,
                                "total": order.pricing.total_amount,
                                "status": order.status,
                                "created_at": order.created_at.to_rfc3339(),
                            })
                        })
                        .collect(),
                ),
            ),
            Err(error) => store_failure("list_my_orders", error),
        }
    }

    pub(super) async fn update_order(&self, order_id: i64, quantity: u32) -> CommandResult {
        if quantity == 0 {
            return CommandResult::fail("update_order", "Quantity must be a positive number");
        }

        match self.orders().set_quantity(OrderId(order_id), quantity).await {
            Ok(Some(order)) => CommandResult::ok_with_data(
                "update_order",
                format!("Updated order #{}", order.id),
                order_row(&order),
            ),
            Ok(None) => CommandResult::fail("update_order", format!("Order {order_id} not found")),
            Err(error) => store_failure("update_order", error),
        }
    }
}

fn past_tense(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "marked pending",
        OrderStatus::Confirmed => "confirmed",
        OrderStatus::Shipped => "shipped",
        OrderStatus::Delivered => "marked as delivered",
        OrderStatus::Cancelled => "cancelled",
        OrderStatus::Refunded => "refunded",
    }
}
