//! Typed action dispatch behind the confirmation gate.
//!
//! `execute` applies the confirmation state machine, decodes the intent into
//! the closed `CommandAction` catalogue, and routes to a handler. Every path
//! ends in a `CommandResult`; nothing raises past this module.

mod admin;
mod billing;
mod customers;
mod orders;
mod products;
mod shops;

use std::sync::Arc;

use kirana_core::catalog::{CommandAction, IntentError};
use kirana_core::command::{CommandResult, MultiStepPlan, ResolvedIntent};
use kirana_core::stores::{
    CategoryStore, CustomerStore, OrderStore, ProductStore, ShopStore, StoreError, UserStore,
};

use crate::confirm::PendingConfirmationStore;

/// The store collaborators the executor dispatches into.
#[derive(Clone)]
pub struct StoreSet {
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    pub shops: Arc<dyn ShopStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub users: Arc<dyn UserStore>,
    pub categories: Arc<dyn CategoryStore>,
}

pub struct ActionExecutor {
    stores: StoreSet,
    confirmations: Arc<PendingConfirmationStore>,
}

impl ActionExecutor {
    pub fn new(stores: StoreSet, confirmations: Arc<PendingConfirmationStore>) -> Self {
        Self { stores, confirmations }
    }

    pub(crate) fn products(&self) -> &dyn ProductStore {
        self.stores.products.as_ref()
    }

    pub(crate) fn orders(&self) -> &dyn OrderStore {
        self.stores.orders.as_ref()
    }

    pub(crate) fn shops(&self) -> &dyn ShopStore {
        self.stores.shops.as_ref()
    }

    pub(crate) fn customers(&self) -> &dyn CustomerStore {
        self.stores.customers.as_ref()
    }

    pub(crate) fn users(&self) -> &dyn UserStore {
        self.stores.users.as_ref()
    }

    pub(crate) fn categories(&self) -> &dyn CategoryStore {
        self.stores.categories.as_ref()
    }

    /// Execute one intent. When the intent is flagged for confirmation and
    /// the caller has not confirmed, the intent is parked behind a fresh
    /// single-use token and nothing else happens.
    pub async fn execute(&self, intent: &ResolvedIntent, confirmed: bool) -> CommandResult {
        if intent.requires_confirmation && !confirmed {
            let message = intent
                .confirmation_message
                .clone()
                .unwrap_or_else(|| format!("Are you sure you want to {}?", intent.action));
            let token = self.confirmations.issue(intent.clone()).await;
            return CommandResult::awaiting_confirmation(&intent.action, message, token);
        }

        let action = match CommandAction::from_intent(intent) {
            Ok(action) => action,
            Err(IntentError::UnknownAction(tag)) => {
                return CommandResult::fail(&intent.action, format!("Unknown action: {tag}"));
            }
            Err(error) => return CommandResult::fail(&intent.action, error.to_string()),
        };

        self.dispatch(action).await
    }

    /// Consume a confirmation token and run the held intent. Tokens are
    /// single-use; a second call with the same token fails here.
    pub async fn confirm(&self, token: &str) -> CommandResult {
        match self.confirmations.take(token).await {
            Some(intent) => self.execute(&intent, true).await,
            None => CommandResult::fail("confirm", "Invalid or expired confirmation ID"),
        }
    }

    /// Run a plan strictly in order. A hard failure halts the plan; a step
    /// pausing for confirmation does not (its token can be confirmed
    /// independently while later steps proceed).
    pub async fn execute_plan(&self, plan: &MultiStepPlan) -> Vec<CommandResult> {
        let mut results = Vec::with_capacity(plan.steps.len());
        for step in &plan.steps {
            let result = self.execute(step, false).await;
            let halt = result.is_hard_failure();
            results.push(result);
            if halt {
                break;
            }
        }
        results
    }

    async fn dispatch(&self, action: CommandAction) -> CommandResult {
        match action {
            CommandAction::CreateProduct(payload) => self.create_product(payload).await,
            CommandAction::UpdateProduct(payload) => self.update_product(payload).await,
            CommandAction::DeleteProduct { product_id } => self.delete_product(product_id).await,
            CommandAction::ListProducts { shop_id, search } => {
                self.list_products(shop_id, search).await
            }
            CommandAction::GetProduct(target) => self.get_product(target).await,
            CommandAction::SearchProducts { query, limit } => {
                self.search_products(query, limit).await
            }
            CommandAction::GetLowStock { shop_id } => self.get_low_stock(shop_id).await,
            CommandAction::RestockProduct { product_id, quantity } => {
                self.restock_product(product_id, quantity).await
            }
            CommandAction::SetProductPrice { product_id, price } => {
                self.set_product_price(product_id, price).await
            }
            CommandAction::ListOrders { status, shop_id } => {
                self.list_orders(status, shop_id).await
            }
            CommandAction::GetOrder { order_id } => self.get_order(order_id).await,
            CommandAction::ConfirmOrder { order_id } => self.confirm_order(order_id).await,
            CommandAction::ShipOrder { order_id, tracking_number } => {
                self.ship_order(order_id, tracking_number).await
            }
            CommandAction::DeliverOrder { order_id } => self.deliver_order(order_id).await,
            CommandAction::CancelOrder { order_id } => self.cancel_order(order_id).await,
            CommandAction::RefundOrder { order_id, reason } => {
                self.refund_order(order_id, reason).await
            }
            CommandAction::PlaceOrder(payload) => self.place_order(payload).await,
            CommandAction::ListMyOrders { customer_email } => {
                self.list_my_orders(customer_email).await
            }
            CommandAction::UpdateOrder { order_id, quantity } => {
                self.update_order(order_id, quantity).await
            }
            CommandAction::ListCustomers => self.list_customers().await,
            CommandAction::GetCustomer(target) => self.get_customer(target).await,
            CommandAction::SearchCustomers { query } => self.search_customers(query).await,
            CommandAction::PrefillShopForm(form) => self.prefill_shop_form(form),
            CommandAction::CreateShop(payload) => self.create_shop(payload).await,
            CommandAction::UpdateShop(payload) => self.update_shop(payload).await,
            CommandAction::DeleteShop { shop_id } => self.delete_shop(shop_id).await,
            CommandAction::ListShops(filter) => self.list_shops(filter).await,
            CommandAction::GetShop(target) => self.get_shop(target).await,
            CommandAction::VerifyShop(target) => self.verify_shop(target).await,
            CommandAction::SuspendShop(target) => self.suspend_shop(target).await,
            CommandAction::ActivateShop(target) => self.activate_shop(target).await,
            CommandAction::GetPendingShops => self.get_pending_shops().await,
            CommandAction::GetShopDashboard { shop_id } => self.get_shop_dashboard(shop_id).await,
            CommandAction::GetShopLowStock { shop_id } => self.get_shop_low_stock(shop_id).await,
            CommandAction::GetShopOrders { shop_id, status } => {
                self.get_shop_orders(shop_id, status).await
            }
            CommandAction::ListUsers { role } => self.list_users(role).await,
            CommandAction::GetUser(target) => self.get_user(target).await,
            CommandAction::GetPlatformStats => self.get_platform_stats().await,
            CommandAction::ListShopCategories => self.list_shop_categories().await,
            CommandAction::CreateShopCategory { name, description, icon } => {
                self.create_shop_category(name, description, icon).await
            }
            CommandAction::SellAtPrice(payload) => self.sell_at_price(payload).await,
            CommandAction::GenerateBill { order_id, view } => {
                self.generate_bill(order_id, view).await
            }
            CommandAction::GetDailyProfit { shop_id, date } => {
                self.get_daily_profit(shop_id, date).await
            }
            CommandAction::GetProductProfit { shop_id } => self.get_product_profit(shop_id).await,
            CommandAction::GetProfitSummary { shop_id } => self.get_profit_summary(shop_id).await,
            CommandAction::Error { message } => CommandResult::fail("error", message),
        }
    }
}

pub(crate) fn store_failure(action: &str, error: StoreError) -> CommandResult {
    CommandResult::fail(action, error.to_string())
}
