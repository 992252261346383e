use rust_decimal::Decimal;
use serde_json::{json, Value};

use kirana_core::catalog::EntityRef;
use kirana_core::command::CommandResult;
use kirana_core::domain::order::OrderStatus;
use kirana_core::domain::user::{UserId, UserRole};
use kirana_core::stores::{NewCategory, OrderFilter, ShopFilter};

use super::{store_failure, ActionExecutor};

impl ActionExecutor {
    pub(super) async fn list_users(&self, role: Option<UserRole>) -> CommandResult {
        match self.users().list(role).await {
            Ok(users) => CommandResult::ok_with_data(
                "list_users",
                format!("Found {} users", users.len()),
                Value::Array(
                    users
                        .iter()
                        .map(|user| {
                            json!({
                                "id": user.id.0,
                                "name": user.name,
                                "email": user.email,
                                "role": user.role,
                                "is_active": user.is_active,
                            })
                        })
                        .collect(),
                ),
            ),
            Err(error) => store_failure("list_users", error),
        }
    }

    pub(super) async fn get_user(&self, target: EntityRef) -> CommandResult {
        let found = match &target {
            EntityRef::Id(id) => self.users().get(UserId(*id)).await,
            EntityRef::Name(email) => self.users().get_by_email(email).await,
        };

        match found {
            Ok(Some(user)) => CommandResult::ok_with_data(
                "get_user",
                format!("Found user: {}", user.name),
                json!({
                    "id": user.id.0,
                    "name": user.name,
                    "email": user.email,
                    "role": user.role,
                    "phone": user.phone,
                    "is_active": user.is_active,
                    "shop_id": user.shop_id.map(|id| id.0),
                }),
            ),
            Ok(None) => CommandResult::fail("get_user", "User not found"),
            Err(error) => store_failure("get_user", error),
        }
    }

    pub(super) async fn get_platform_stats(&self) -> CommandResult {
        let users = match self.users().list(None).await {
            Ok(users) => users,
            Err(error) => return store_failure("get_platform_stats", error),
        };
        let shops = match self.shops().list(ShopFilter::default()).await {
            Ok(shops) => shops,
            Err(error) => return store_failure("get_platform_stats", error),
        };
        let products = match self.products().list(None).await {
            Ok(products) => products,
            Err(error) => return store_failure("get_platform_stats", error),
        };
        let orders = match self.orders().list(OrderFilter::default()).await {
            Ok(orders) => orders,
            Err(error) => return store_failure("get_platform_stats", error),
        };

        let verified_shops = shops.iter().filter(|shop| shop.is_verified).count();
        let total_revenue: Decimal = orders
            .iter()
            .filter(|order| order.status != OrderStatus::Cancelled)
            .map(|order| order.pricing.total_amount)
            .sum();

        CommandResult::ok_with_data(
            "get_platform_stats",
            "Platform statistics retrieved",
            json!({
                "total_users": users.len(),
                "total_shops": shops.len(),
                "verified_shops": verified_shops,
                "pending_shops": shops.len() - verified_shops,
                "total_products": products.len(),
                "total_orders": orders.len(),
                "total_revenue": total_revenue,
            }),
        )
    }

    pub(super) async fn list_shop_categories(&self) -> CommandResult {
        match self.categories().list().await {
            Ok(categories) => CommandResult::ok_with_data(
                "list_shop_categories",
                format!("Found {} shop categories", categories.len()),
                Value::Array(
                    categories
                        .iter()
                        .map(|category| {
                            json!({
                                "id": category.id.0,
                                "name": category.name,
                                "description": category.description,
                                "icon": category.icon,
                            })
                        })
                        .collect(),
                ),
            ),
            Err(error) => store_failure("list_shop_categories", error),
        }
    }

    pub(super) async fn create_shop_category(
        &self,
        name: String,
        description: Option<String>,
        icon: Option<String>,
    ) -> CommandResult {
        let category = NewCategory { name, description, icon };

        match self.categories().create(category).await {
            Ok(category) => CommandResult::ok_with_data(
                "create_shop_category",
                format!("Created shop category '{}'", category.name),
                json!({"id": category.id.0, "name": category.name}),
            ),
            Err(error) => store_failure("create_shop_category", error),
        }
    }
}
