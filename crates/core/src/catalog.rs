//! The closed action catalogue.
//!
//! Every tag the resolver may emit is decoded here, exactly once, into a
//! typed `CommandAction` payload. Dispatch downstream matches exhaustively,
//! so adding an action is a compile-checked change rather than a silent
//! dictionary miss.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

use crate::billing::bills::BillView;
use crate::command::ResolvedIntent;
use crate::domain::order::OrderStatus;
use crate::domain::user::UserRole;

/// Bumped whenever a tag is added, renamed, or removed.
pub const ACTION_VOCABULARY_VERSION: &str = "v1";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IntentError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Missing required parameter: {name}")]
    MissingParameter { action: &'static str, name: &'static str },
    #[error("Invalid parameter `{name}`: expected {expected}")]
    InvalidParameter { action: &'static str, name: &'static str, expected: &'static str },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateProduct {
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub quantity: u32,
    pub cost_price: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub sku: Option<String>,
    pub shop_id: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateProduct {
    pub product_id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub quantity: Option<u32>,
    pub is_active: Option<bool>,
}

/// Lookup by id or, failing that, by name. At least one must be present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityRef {
    Id(i64),
    Name(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaceOrder {
    pub product_id: i64,
    pub quantity: u32,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShopFormData {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub gst_number: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateShop {
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
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateShop {
    pub shop_id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListShopsFilter {
    pub category_id: Option<i64>,
    pub city: Option<String>,
    pub search: Option<String>,
    pub is_verified: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SellAtPrice {
    pub product_id: i64,
    pub price: Decimal,
    pub quantity: u32,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub force: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommandAction {
    // Products
    CreateProduct(CreateProduct),
    UpdateProduct(UpdateProduct),
    DeleteProduct { product_id: i64 },
    ListProducts { shop_id: Option<i64>, search: Option<String> },
    GetProduct(EntityRef),
    SearchProducts { query: String, limit: u32 },
    GetLowStock { shop_id: Option<i64> },
    RestockProduct { product_id: i64, quantity: u32 },
    SetProductPrice { product_id: i64, price: Decimal },
    // Orders
    ListOrders { status: Option<OrderStatus>, shop_id: Option<i64> },
    GetOrder { order_id: i64 },
    ConfirmOrder { order_id: i64 },
    ShipOrder { order_id: i64, tracking_number: Option<String> },
    DeliverOrder { order_id: i64 },
    CancelOrder { order_id: i64 },
    RefundOrder { order_id: i64, reason: Option<String> },
    PlaceOrder(PlaceOrder),
    ListMyOrders { customer_email: Option<String> },
    UpdateOrder { order_id: i64, quantity: u32 },
    // Customers
    ListCustomers,
    GetCustomer(EntityRef),
    SearchCustomers { query: String },
    // Shops
    PrefillShopForm(ShopFormData),
    CreateShop(CreateShop),
    UpdateShop(UpdateShop),
    DeleteShop { shop_id: i64 },
    ListShops(ListShopsFilter),
    GetShop(EntityRef),
    VerifyShop(EntityRef),
    SuspendShop(EntityRef),
    ActivateShop(EntityRef),
    GetPendingShops,
    // Shop dashboard
    GetShopDashboard { shop_id: i64 },
    GetShopLowStock { shop_id: i64 },
    GetShopOrders { shop_id: i64, status: Option<OrderStatus> },
    // Users & platform
    ListUsers { role: Option<UserRole> },
    GetUser(EntityRef),
    GetPlatformStats,
    // Categories
    ListShopCategories,
    CreateShopCategory { name: String, description: Option<String>, icon: Option<String> },
    // Billing
    SellAtPrice(SellAtPrice),
    GenerateBill { order_id: i64, view: BillView },
    GetDailyProfit { shop_id: i64, date: Option<NaiveDate> },
    GetProductProfit { shop_id: i64 },
    GetProfitSummary { shop_id: i64 },
    // Diagnostic passthrough
    Error { message: String },
}

impl CommandAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateProduct(_) => "create_product",
            Self::UpdateProduct(_) => "update_product",
            Self::DeleteProduct { .. } => "delete_product",
            Self::ListProducts { .. } => "list_products",
            Self::GetProduct(_) => "get_product",
            Self::SearchProducts { .. } => "search_products",
            Self::GetLowStock { .. } => "get_low_stock",
            Self::RestockProduct { .. } => "restock_product",
            Self::SetProductPrice { .. } => "set_product_price",
            Self::ListOrders { .. } => "list_orders",
            Self::GetOrder { .. } => "get_order",
            Self::ConfirmOrder { .. } => "confirm_order",
            Self::ShipOrder { .. } => "ship_order",
            Self::DeliverOrder { .. } => "deliver_order",
            Self::CancelOrder { .. } => "cancel_order",
            Self::RefundOrder { .. } => "refund_order",
            Self::PlaceOrder(_) => "place_order",
            Self::ListMyOrders { .. } => "list_my_orders",
            Self::UpdateOrder { .. } => "update_order",
            Self::ListCustomers => "list_customers",
            Self::GetCustomer(_) => "get_customer",
            Self::SearchCustomers { .. } => "search_customers",
            Self::PrefillShopForm(_) => "prefill_shop_form",
            Self::CreateShop(_) => "create_shop",
            Self::UpdateShop(_) => "update_shop",
            Self::DeleteShop { .. } => "delete_shop",
            Self::ListShops(_) => "list_shops",
            Self::GetShop(_) => "get_shop",
            Self::VerifyShop(_) => "verify_shop",
            Self::SuspendShop(_) => "suspend_shop",
            Self::ActivateShop(_) => "activate_shop",
            Self::GetPendingShops => "get_pending_shops",
            Self::GetShopDashboard { .. } => "get_shop_dashboard",
            Self::GetShopLowStock { .. } => "get_shop_low_stock",
            Self::GetShopOrders { .. } => "get_shop_orders",
            Self::ListUsers { .. } => "list_users",
            Self::GetUser(_) => "get_user",
            Self::GetPlatformStats => "get_platform_stats",
            Self::ListShopCategories => "list_shop_categories",
            Self::CreateShopCategory { .. } => "create_shop_category",
            Self::SellAtPrice(_) => "sell_at_price",
            Self::GenerateBill { .. } => "generate_bill",
            Self::GetDailyProfit { .. } => "get_daily_profit",
            Self::GetProductProfit { .. } => "get_product_profit",
            Self::GetProfitSummary { .. } => "get_profit_summary",
            Self::Error { .. } => "error",
        }
    }

    /// Destructive tags the resolver must gate behind confirmation.
    pub fn is_destructive_tag(tag: &str) -> bool {
        matches!(
            tag,
            "delete_product" | "delete_shop" | "cancel_order" | "refund_order" | "suspend_shop"
        )
    }

    /// Decode a loosely-typed intent into a typed action, validating required
    /// parameters exactly once.
    pub fn from_intent(intent: &ResolvedIntent) -> Result<Self, IntentError> {
        let params = &intent.parameters;
        match intent.action.as_str() {
            "create_product" => Ok(Self::CreateProduct(CreateProduct {
                name: require_string(params, "create_product", "name")?,
                price: require_decimal(params, "create_product", "price")?,
                description: opt_string(params, "description"),
                quantity: opt_u32(params, "create_product", "quantity")?.unwrap_or(0),
                cost_price: opt_decimal(params, "create_product", "cost_price")?,
                min_price: opt_decimal(params, "create_product", "min_price")?,
                sku: opt_string(params, "sku"),
                shop_id: opt_i64(params, "create_product", "shop_id")?,
            })),
            "update_product" => Ok(Self::UpdateProduct(UpdateProduct {
                product_id: require_i64(params, "update_product", "product_id")?,
                name: opt_string(params, "name"),
                description: opt_string(params, "description"),
                price: opt_decimal(params, "update_product", "price")?,
                cost_price: opt_decimal(params, "update_product", "cost_price")?,
                min_price: opt_decimal(params, "update_product", "min_price")?,
                quantity: opt_u32(params, "update_product", "quantity")?,
                is_active: opt_bool(params, "is_active"),
            })),
            "delete_product" => Ok(Self::DeleteProduct {
                product_id: require_i64(params, "delete_product", "product_id")?,
            }),
            "list_products" => Ok(Self::ListProducts {
                shop_id: opt_i64(params, "list_products", "shop_id")?,
                search: opt_string(params, "search"),
            }),
            "get_product" => Ok(Self::GetProduct(entity_ref(
                params,
                "get_product",
                "product_id",
                "name",
            )?)),
            "search_products" => Ok(Self::SearchProducts {
                query: require_string(params, "search_products", "query")?,
                limit: opt_u32(params, "search_products", "limit")?.unwrap_or(20),
            }),
            "get_low_stock" => {
                Ok(Self::GetLowStock { shop_id: opt_i64(params, "get_low_stock", "shop_id")? })
            }
            "restock_product" => Ok(Self::RestockProduct {
                product_id: require_i64(params, "restock_product", "product_id")?,
                quantity: require_u32(params, "restock_product", "quantity")?,
            }),
            "set_product_price" => Ok(Self::SetProductPrice {
                product_id: require_i64(params, "set_product_price", "product_id")?,
                price: require_decimal(params, "set_product_price", "price")?,
            }),
            "list_orders" => Ok(Self::ListOrders {
                status: opt_status(params, "list_orders")?,
                shop_id: opt_i64(params, "list_orders", "shop_id")?,
            }),
            "get_order" => {
                Ok(Self::GetOrder { order_id: require_i64(params, "get_order", "order_id")? })
            }
            "confirm_order" => Ok(Self::ConfirmOrder {
                order_id: require_i64(params, "confirm_order", "order_id")?,
            }),
            "ship_order" => Ok(Self::ShipOrder {
                order_id: require_i64(params, "ship_order", "order_id")?,
                tracking_number: opt_string(params, "tracking_number"),
            }),
            "deliver_order" => Ok(Self::DeliverOrder {
                order_id: require_i64(params, "deliver_order", "order_id")?,
            }),
            "cancel_order" => {
                Ok(Self::CancelOrder { order_id: require_i64(params, "cancel_order", "order_id")? })
            }
            "refund_order" => Ok(Self::RefundOrder {
                order_id: require_i64(params, "refund_order", "order_id")?,
                reason: opt_string(params, "reason"),
            }),
            "place_order" => Ok(Self::PlaceOrder(PlaceOrder {
                product_id: require_i64(params, "place_order", "product_id")?,
                quantity: opt_u32(params, "place_order", "quantity")?.unwrap_or(1),
                customer_name: opt_string(params, "customer_name"),
                customer_email: opt_string(params, "customer_email"),
            })),
            "list_my_orders" => {
                Ok(Self::ListMyOrders { customer_email: opt_string(params, "customer_email") })
            }
            "update_order" => Ok(Self::UpdateOrder {
                order_id: require_i64(params, "update_order", "order_id")?,
                quantity: require_u32(params, "update_order", "quantity")?,
            }),
            "list_customers" => Ok(Self::ListCustomers),
            "get_customer" => Ok(Self::GetCustomer(entity_ref(
                params,
                "get_customer",
                "customer_id",
                "email",
            )?)),
            "search_customers" => Ok(Self::SearchCustomers {
                query: require_string(params, "search_customers", "query")?,
            }),
            "prefill_shop_form" => Ok(Self::PrefillShopForm(ShopFormData {
                name: opt_string(params, "name"),
                description: opt_string(params, "description"),
                category_id: opt_i64(params, "prefill_shop_form", "category_id")?,
                owner_name: opt_string(params, "owner_name"),
                owner_email: opt_string(params, "owner_email"),
                owner_phone: opt_string(params, "owner_phone"),
                address: opt_string(params, "address"),
                city: opt_string(params, "city"),
                pincode: opt_string(params, "pincode"),
                gst_number: opt_string(params, "gst_number"),
            })),
            "create_shop" => Ok(Self::CreateShop(CreateShop {
                name: require_string(params, "create_shop", "name")?,
                description: opt_string(params, "description"),
                category_id: opt_i64(params, "create_shop", "category_id")?,
                owner_name: opt_string(params, "owner_name").unwrap_or_default(),
                owner_email: opt_string(params, "owner_email").unwrap_or_default(),
                owner_phone: opt_string(params, "owner_phone"),
                address: opt_string(params, "address"),
                city: opt_string(params, "city"),
                pincode: opt_string(params, "pincode"),
                gst_number: opt_string(params, "gst_number"),
            })),
            "update_shop" => Ok(Self::UpdateShop(UpdateShop {
                shop_id: require_i64(params, "update_shop", "shop_id")?,
                name: opt_string(params, "name"),
                description: opt_string(params, "description"),
                address: opt_string(params, "address"),
                city: opt_string(params, "city"),
                pincode: opt_string(params, "pincode"),
            })),
            "delete_shop" => {
                Ok(Self::DeleteShop { shop_id: require_i64(params, "delete_shop", "shop_id")? })
            }
            "list_shops" => Ok(Self::ListShops(ListShopsFilter {
                category_id: opt_i64(params, "list_shops", "category_id")?,
                city: opt_string(params, "city"),
                search: opt_string(params, "search"),
                is_verified: opt_bool(params, "is_verified"),
                is_active: opt_bool(params, "is_active"),
            })),
            "get_shop" => Ok(Self::GetShop(entity_ref(params, "get_shop", "shop_id", "name")?)),
            "verify_shop" => {
                Ok(Self::VerifyShop(entity_ref(params, "verify_shop", "shop_id", "name")?))
            }
            "suspend_shop" => {
                Ok(Self::SuspendShop(entity_ref(params, "suspend_shop", "shop_id", "name")?))
            }
            "activate_shop" => {
                Ok(Self::ActivateShop(entity_ref(params, "activate_shop", "shop_id", "name")?))
            }
            "get_pending_shops" => Ok(Self::GetPendingShops),
            "get_shop_dashboard" => Ok(Self::GetShopDashboard {
                shop_id: require_i64(params, "get_shop_dashboard", "shop_id")?,
            }),
            "get_shop_low_stock" => Ok(Self::GetShopLowStock {
                shop_id: require_i64(params, "get_shop_low_stock", "shop_id")?,
            }),
            "get_shop_orders" => Ok(Self::GetShopOrders {
                shop_id: require_i64(params, "get_shop_orders", "shop_id")?,
                status: opt_status(params, "get_shop_orders")?,
            }),
            "list_users" => Ok(Self::ListUsers { role: opt_role(params, "list_users")? }),
            "get_user" => Ok(Self::GetUser(entity_ref(params, "get_user", "user_id", "email")?)),
            "get_platform_stats" => Ok(Self::GetPlatformStats),
            "list_shop_categories" => Ok(Self::ListShopCategories),
            "create_shop_category" => Ok(Self::CreateShopCategory {
                name: require_string(params, "create_shop_category", "name")?,
                description: opt_string(params, "description"),
                icon: opt_string(params, "icon"),
            }),
            "sell_at_price" => {
                let price = match opt_decimal(params, "sell_at_price", "price")? {
                    Some(price) => price,
                    None => opt_decimal(params, "sell_at_price", "selling_price")?.ok_or(
                        IntentError::MissingParameter { action: "sell_at_price", name: "price" },
                    )?,
                };
                Ok(Self::SellAtPrice(SellAtPrice {
                    product_id: require_i64(params, "sell_at_price", "product_id")?,
                    price,
                    quantity: opt_u32(params, "sell_at_price", "quantity")?.unwrap_or(1),
                    customer_name: opt_string(params, "customer_name")
                        .unwrap_or_else(|| "Walk-in Customer".to_string()),
                    customer_phone: opt_string(params, "customer_phone"),
                    force: opt_bool(params, "force").unwrap_or(false),
                }))
            }
            "generate_bill" => {
                let view = match opt_string(params, "bill_type") {
                    Some(raw) => BillView::parse(&raw).ok_or(IntentError::InvalidParameter {
                        action: "generate_bill",
                        name: "bill_type",
                        expected: "customer|admin",
                    })?,
                    None => BillView::Customer,
                };
                Ok(Self::GenerateBill {
                    order_id: require_i64(params, "generate_bill", "order_id")?,
                    view,
                })
            }
            "get_daily_profit" => {
                let date = match opt_string(params, "date") {
                    Some(raw) => Some(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(
                        |_| IntentError::InvalidParameter {
                            action: "get_daily_profit",
                            name: "date",
                            expected: "YYYY-MM-DD",
                        },
                    )?),
                    None => None,
                };
                Ok(Self::GetDailyProfit {
                    shop_id: require_i64(params, "get_daily_profit", "shop_id")?,
                    date,
                })
            }
            "get_product_profit" => Ok(Self::GetProductProfit {
                shop_id: require_i64(params, "get_product_profit", "shop_id")?,
            }),
            "get_profit_summary" => Ok(Self::GetProfitSummary {
                shop_id: require_i64(params, "get_profit_summary", "shop_id")?,
            }),
            "error" => Ok(Self::Error {
                message: opt_string(params, "error")
                    .unwrap_or_else(|| "An unknown error occurred".to_string()),
            }),
            other => Err(IntentError::UnknownAction(other.to_string())),
        }
    }
}

fn entity_ref(
    params: &Map<String, Value>,
    action: &'static str,
    id_key: &'static str,
    name_key: &'static str,
) -> Result<EntityRef, IntentError> {
    if let Some(id) = opt_i64(params, action, id_key)? {
        return Ok(EntityRef::Id(id));
    }
    if let Some(name) = opt_string(params, name_key) {
        return Ok(EntityRef::Name(name));
    }
    Err(IntentError::MissingParameter { action, name: id_key })
}

// The language model emits numbers sometimes as JSON numbers and sometimes
// as strings; both forms are accepted everywhere a scalar is expected.

fn opt_i64(
    params: &Map<String, Value>,
    action: &'static str,
    key: &'static str,
) -> Result<Option<i64>, IntentError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .map(Some)
            .ok_or(IntentError::InvalidParameter { action, name: key, expected: "integer" }),
        Some(Value::String(raw)) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| IntentError::InvalidParameter { action, name: key, expected: "integer" }),
        Some(_) => Err(IntentError::InvalidParameter { action, name: key, expected: "integer" }),
    }
}

fn require_i64(
    params: &Map<String, Value>,
    action: &'static str,
    key: &'static str,
) -> Result<i64, IntentError> {
    opt_i64(params, action, key)?.ok_or(IntentError::MissingParameter { action, name: key })
}

fn opt_u32(
    params: &Map<String, Value>,
    action: &'static str,
    key: &'static str,
) -> Result<Option<u32>, IntentError> {
    match opt_i64(params, action, key)? {
        None => Ok(None),
        Some(value) => u32::try_from(value).map(Some).map_err(|_| {
            IntentError::InvalidParameter { action, name: key, expected: "non-negative integer" }
        }),
    }
}

fn require_u32(
    params: &Map<String, Value>,
    action: &'static str,
    key: &'static str,
) -> Result<u32, IntentError> {
    opt_u32(params, action, key)?.ok_or(IntentError::MissingParameter { action, name: key })
}

fn opt_decimal(
    params: &Map<String, Value>,
    action: &'static str,
    key: &'static str,
) -> Result<Option<Decimal>, IntentError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Decimal::from_str(&number.to_string())
            .map(Some)
            .map_err(|_| IntentError::InvalidParameter { action, name: key, expected: "amount" }),
        Some(Value::String(raw)) => Decimal::from_str(raw.trim())
            .map(Some)
            .map_err(|_| IntentError::InvalidParameter { action, name: key, expected: "amount" }),
        Some(_) => Err(IntentError::InvalidParameter { action, name: key, expected: "amount" }),
    }
}

fn require_decimal(
    params: &Map<String, Value>,
    action: &'static str,
    key: &'static str,
) -> Result<Decimal, IntentError> {
    opt_decimal(params, action, key)?.ok_or(IntentError::MissingParameter { action, name: key })
}

fn opt_string(params: &Map<String, Value>, key: &str) -> Option<String> {
    match params.get(key) {
        Some(Value::String(raw)) if !raw.trim().is_empty() => Some(raw.trim().to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}

fn require_string(
    params: &Map<String, Value>,
    action: &'static str,
    key: &'static str,
) -> Result<String, IntentError> {
    opt_string(params, key).ok_or(IntentError::MissingParameter { action, name: key })
}

fn opt_bool(params: &Map<String, Value>, key: &str) -> Option<bool> {
    match params.get(key) {
        Some(Value::Bool(value)) => Some(*value),
        Some(Value::String(raw)) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn opt_status(
    params: &Map<String, Value>,
    action: &'static str,
) -> Result<Option<OrderStatus>, IntentError> {
    match opt_string(params, "status") {
        None => Ok(None),
        Some(raw) => OrderStatus::parse(&raw).map(Some).ok_or(IntentError::InvalidParameter {
            action,
            name: "status",
            expected: "pending|confirmed|shipped|delivered|cancelled|refunded",
        }),
    }
}

fn opt_role(
    params: &Map<String, Value>,
    action: &'static str,
) -> Result<Option<UserRole>, IntentError> {
    match opt_string(params, "role") {
        None => Ok(None),
        Some(raw) => UserRole::parse(&raw).map(Some).ok_or(IntentError::InvalidParameter {
            action,
            name: "role",
            expected: "super_admin|admin|customer",
        }),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::billing::bills::BillView;
    use crate::command::ResolvedIntent;
    use crate::domain::order::OrderStatus;

    use super::{CommandAction, EntityRef, IntentError};

    fn intent(action: &str, params: serde_json::Value) -> ResolvedIntent {
        let mut intent = ResolvedIntent::new(action);
        intent.parameters = params.as_object().expect("params object").clone();
        intent
    }

    #[test]
    fn unknown_tag_is_rejected_not_panicked() {
        let error = CommandAction::from_intent(&intent("drop_database", json!({})))
            .expect_err("unknown tag");
        assert_eq!(error, IntentError::UnknownAction("drop_database".to_string()));
    }

    #[test]
    fn missing_required_parameter_names_the_parameter() {
        let error = CommandAction::from_intent(&intent("create_product", json!({"price": 99})))
            .expect_err("missing name");
        assert_eq!(error.to_string(), "Missing required parameter: name");
    }

    #[test]
    fn numeric_parameters_accept_string_and_number_forms() {
        let from_number = CommandAction::from_intent(&intent(
            "sell_at_price",
            json!({"product_id": 5, "price": 100}),
        ))
        .expect("number form");
        let from_string = CommandAction::from_intent(&intent(
            "sell_at_price",
            json!({"product_id": "5", "price": "100"}),
        ))
        .expect("string form");

        assert_eq!(from_number, from_string);
        if let CommandAction::SellAtPrice(sale) = from_number {
            assert_eq!(sale.product_id, 5);
            assert_eq!(sale.price, Decimal::from(100));
            assert_eq!(sale.quantity, 1);
            assert_eq!(sale.customer_name, "Walk-in Customer");
            assert!(!sale.force);
        } else {
            panic!("expected sell_at_price");
        }
    }

    #[test]
    fn sell_at_price_accepts_selling_price_alias() {
        let action = CommandAction::from_intent(&intent(
            "sell_at_price",
            json!({"product_id": 2, "selling_price": 80.5}),
        ))
        .expect("selling_price alias");
        if let CommandAction::SellAtPrice(sale) = action {
            assert_eq!(sale.price.to_string(), "80.5");
        } else {
            panic!("expected sell_at_price");
        }
    }

    #[test]
    fn entity_lookups_fall_back_from_id_to_name() {
        let by_id = CommandAction::from_intent(&intent("get_shop", json!({"shop_id": 3})))
            .expect("by id");
        assert_eq!(by_id, CommandAction::GetShop(EntityRef::Id(3)));

        let by_name = CommandAction::from_intent(&intent("get_shop", json!({"name": "Tech Hub"})))
            .expect("by name");
        assert_eq!(by_name, CommandAction::GetShop(EntityRef::Name("Tech Hub".to_string())));

        let neither =
            CommandAction::from_intent(&intent("get_shop", json!({}))).expect_err("neither");
        assert_eq!(neither.to_string(), "Missing required parameter: shop_id");
    }

    #[test]
    fn list_orders_decodes_status_filter() {
        let action = CommandAction::from_intent(&intent("list_orders", json!({"status": "pending"})))
            .expect("status filter");
        assert_eq!(
            action,
            CommandAction::ListOrders { status: Some(OrderStatus::Pending), shop_id: None }
        );

        let bad = CommandAction::from_intent(&intent("list_orders", json!({"status": "teleported"})))
            .expect_err("bad status");
        assert!(matches!(bad, IntentError::InvalidParameter { name: "status", .. }));
    }

    #[test]
    fn generate_bill_defaults_to_customer_view() {
        let action = CommandAction::from_intent(&intent("generate_bill", json!({"order_id": 9})))
            .expect("default view");
        assert_eq!(action, CommandAction::GenerateBill { order_id: 9, view: BillView::Customer });

        let admin = CommandAction::from_intent(&intent(
            "generate_bill",
            json!({"order_id": 9, "bill_type": "admin"}),
        ))
        .expect("admin view");
        assert_eq!(admin, CommandAction::GenerateBill { order_id: 9, view: BillView::Admin });
    }

    #[test]
    fn daily_profit_validates_date_format() {
        let bad = CommandAction::from_intent(&intent(
            "get_daily_profit",
            json!({"shop_id": 1, "date": "03-01-2025"}),
        ))
        .expect_err("bad date");
        assert!(matches!(bad, IntentError::InvalidParameter { name: "date", .. }));
    }

    #[test]
    fn destructive_tags_cover_delete_cancel_suspend() {
        for tag in ["delete_product", "delete_shop", "cancel_order", "refund_order", "suspend_shop"]
        {
            assert!(CommandAction::is_destructive_tag(tag), "{tag} should be destructive");
        }
        assert!(!CommandAction::is_destructive_tag("list_orders"));
    }

    #[test]
    fn every_catalogue_tag_round_trips_through_name() {
        let samples = vec![
            intent("list_products", json!({})),
            intent("get_low_stock", json!({})),
            intent("list_orders", json!({})),
            intent("list_customers", json!({})),
            intent("get_pending_shops", json!({})),
            intent("get_platform_stats", json!({})),
            intent("list_shop_categories", json!({})),
            intent("list_my_orders", json!({})),
            intent("list_users", json!({})),
            intent("list_shops", json!({})),
            intent("prefill_shop_form", json!({})),
            intent("error", json!({"error": "x"})),
        ];

        for sample in samples {
            let action = CommandAction::from_intent(&sample).expect("decode");
            assert_eq!(action.name(), sample.action);
        }
    }
}
