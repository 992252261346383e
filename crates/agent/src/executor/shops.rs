use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

use kirana_core::catalog::{CreateShop, EntityRef, ListShopsFilter, ShopFormData, UpdateShop};
use kirana_core::command::CommandResult;
use kirana_core::domain::order::OrderStatus;
use kirana_core::domain::shop::{Shop, ShopId};
use kirana_core::stores::{NewShop, OrderFilter, ShopFilter, ShopPatch};

use super::{store_failure, ActionExecutor};

fn shop_row(shop: &Shop) -> Value {
    json!({
        "id": shop.id.0,
        "name": shop.name,
        "city": shop.city,
        "is_verified": shop.is_verified,
        "is_active": shop.is_active,
        "rating": shop.rating,
    })
}

impl ActionExecutor {
    /// Shop creation goes through a verification workflow, so "add shop"
    /// resolves here: the structured form data goes back to the caller for
    /// the operator to review and submit.
    pub(super) fn prefill_shop_form(&self, form: ShopFormData) -> CommandResult {
        let mut form_data = Map::new();
        let fields = [
            ("name", form.name),
            ("description", form.description),
            ("category_id", form.category_id.map(|id| id.to_string())),
            ("owner_name", form.owner_name),
            ("owner_email", form.owner_email),
            ("owner_phone", form.owner_phone),
            ("address", form.address),
            ("city", form.city),
            ("pincode", form.pincode),
            ("gst_number", form.gst_number),
        ];

        let mut filled = Vec::new();
        for (key, value) in fields {
            if let Some(value) = &value {
                if !value.is_empty() {
                    filled.push(key);
                }
            }
            form_data.insert(key.to_string(), Value::from(value.unwrap_or_default()));
        }

        let mut message = "Opening shop registration form".to_string();
        if !filled.is_empty() {
            message.push_str(&format!(" with: {}", filled.join(", ")));
        }

        CommandResult::ok_with_data(
            "prefill_shop_form",
            message,
            json!({
                "action_type": "prefill_form",
                "form_type": "shop_registration",
                "form_data": form_data,
            }),
        )
    }

    pub(super) async fn create_shop(&self, payload: CreateShop) -> CommandResult {
        let shop = NewShop {
            name: payload.name,
            description: payload.description,
            category_id: payload.category_id,
            owner_name: payload.owner_name,
            owner_email: payload.owner_email,
            owner_phone: payload.owner_phone,
            address: payload.address,
            city: payload.city,
            pincode: payload.pincode,
            gst_number: payload.gst_number,
        };

        match self.shops().create(shop).await {
            Ok(shop) => CommandResult::ok_with_data(
                "create_shop",
                format!(
                    "Created shop '{}' with ID {}. Status: Pending verification.",
                    shop.name, shop.id
                ),
                json!({"id": shop.id.0, "name": shop.name, "is_verified": shop.is_verified}),
            ),
            Err(error) => store_failure("create_shop", error),
        }
    }

    pub(super) async fn update_shop(&self, payload: UpdateShop) -> CommandResult {
        let shop_id = ShopId(payload.shop_id);
        let patch = ShopPatch {
            name: payload.name,
            description: payload.description,
            address: payload.address,
            city: payload.city,
            pincode: payload.pincode,
        };

        match self.shops().update(shop_id, patch).await {
            Ok(Some(shop)) => CommandResult::ok_with_data(
                "update_shop",
                format!("Updated shop '{}'", shop.name),
                json!({"id": shop.id.0, "name": shop.name}),
            ),
            Ok(None) => CommandResult::fail("update_shop", format!("Shop {shop_id} not found")),
            Err(error) => store_failure("update_shop", error),
        }
    }

    pub(super) async fn delete_shop(&self, shop_id: i64) -> CommandResult {
        match self.shops().delete(ShopId(shop_id)).await {
            Ok(true) => CommandResult::ok("delete_shop", format!("Deleted shop {shop_id}")),
            Ok(false) => CommandResult::fail("delete_shop", format!("Shop {shop_id} not found")),
            Err(error) => store_failure("delete_shop", error),
        }
    }

    pub(super) async fn list_shops(&self, filter: ListShopsFilter) -> CommandResult {
        let filter = ShopFilter {
            category_id: filter.category_id,
            city: filter.city,
            search: filter.search,
            is_verified: filter.is_verified,
            is_active: filter.is_active,
        };

        match self.shops().list(filter).await {
            Ok(shops) => CommandResult::ok_with_data(
                "list_shops",
                format!("Found {} shops", shops.len()),
                Value::Array(shops.iter().map(shop_row).collect()),
            ),
            Err(error) => store_failure("list_shops", error),
        }
    }

    pub(super) async fn find_shop(&self, target: &EntityRef) -> Result<Option<Shop>, CommandResult> {
        let found = match target {
            EntityRef::Id(id) => self.shops().get(ShopId(*id)).await,
            EntityRef::Name(name) => self.shops().get_by_name(name).await,
        };
        found.map_err(|error| store_failure("get_shop", error))
    }

    pub(super) async fn get_shop(&self, target: EntityRef) -> CommandResult {
        match self.find_shop(&target).await {
            Ok(Some(shop)) => CommandResult::ok_with_data(
                "get_shop",
                format!("Found shop: {}", shop.name),
                json!({
                    "id": shop.id.0,
                    "name": shop.name,
                    "description": shop.description,
                    "city": shop.city,
                    "is_verified": shop.is_verified,
                    "is_active": shop.is_active,
                    "rating": shop.rating,
                    "total_orders": shop.total_orders,
                    "total_revenue": shop.total_revenue,
                }),
            ),
            Ok(None) => CommandResult::fail("get_shop", "Shop not found"),
            Err(failure) => failure,
        }
    }

    pub(super) async fn verify_shop(&self, target: EntityRef) -> CommandResult {
        let shop = match self.find_shop(&target).await {
            Ok(Some(shop)) => shop,
            Ok(None) => return CommandResult::fail("verify_shop", "Shop not found"),
            Err(failure) => return failure,
        };

        if shop.is_verified {
            return CommandResult::fail(
                "verify_shop",
                format!("Shop '{}' is already verified", shop.name),
            );
        }

        match self.shops().set_verified(shop.id, true).await {
            Ok(Some(shop)) => CommandResult::ok_with_data(
                "verify_shop",
                format!("Shop '{}' has been verified and approved", shop.name),
                json!({"id": shop.id.0, "name": shop.name, "is_verified": true}),
            ),
            Ok(None) => CommandResult::fail("verify_shop", "Shop not found"),
            Err(error) => store_failure("verify_shop", error),
        }
    }

    pub(super) async fn suspend_shop(&self, target: EntityRef) -> CommandResult {
        let shop = match self.find_shop(&target).await {
            Ok(Some(shop)) => shop,
            Ok(None) => return CommandResult::fail("suspend_shop", "Shop not found"),
            Err(failure) => return failure,
        };

        if !shop.is_active {
            return CommandResult::fail(
                "suspend_shop",
                format!("Shop '{}' is already suspended", shop.name),
            );
        }

        match self.shops().set_active(shop.id, false).await {
            Ok(Some(shop)) => CommandResult::ok_with_data(
                "suspend_shop",
                format!("Shop '{}' has been suspended", shop.name),
                json!({"id": shop.id.0, "name": shop.name, "is_active": false}),
            ),
            Ok(None) => CommandResult::fail("suspend_shop", "Shop not found"),
            Err(error) => store_failure("suspend_shop", error),
        }
    }

    pub(super) async fn activate_shop(&self, target: EntityRef) -> CommandResult {
        let shop = match self.find_shop(&target).await {
            Ok(Some(shop)) => shop,
            Ok(None) => return CommandResult::fail("activate_shop", "Shop not found"),
            Err(failure) => return failure,
        };

        if shop.is_active {
            return CommandResult::fail(
                "activate_shop",
                format!("Shop '{}' is already active", shop.name),
            );
        }

        match self.shops().set_active(shop.id, true).await {
            Ok(Some(shop)) => CommandResult::ok_with_data(
                "activate_shop",
                format!("Shop '{}' has been activated", shop.name),
                json!({"id": shop.id.0, "name": shop.name, "is_active": true}),
            ),
            Ok(None) => CommandResult::fail("activate_shop", "Shop not found"),
            Err(error) => store_failure("activate_shop", error),
        }
    }

    pub(super) async fn get_pending_shops(&self) -> CommandResult {
        let filter = ShopFilter { is_verified: Some(false), ..ShopFilter::default() };

        match self.shops().list(filter).await {
            Ok(shops) => CommandResult::ok_with_data(
                "get_pending_shops",
                format!("Found {} shops pending verification", shops.len()),
                Value::Array(
                    shops
                        .iter()
                        .map(|shop| {
                            json!({
                                "id": shop.id.0,
                                "name": shop.name,
                                "owner_name": shop.owner_name,
                                "owner_email": shop.owner_email,
                                "city": shop.city,
                                "created_at": shop.created_at.to_rfc3339(),
                            })
                        })
                        .collect(),
                ),
            ),
            Err(error) => store_failure("get_pending_shops", error),
        }
    }

    pub(super) async fn get_shop_dashboard(&self, shop_id: i64) -> CommandResult {
        let shop = match self.shops().get(ShopId(shop_id)).await {
            Ok(Some(shop)) => shop,
            Ok(None) => {
                return CommandResult::fail(
                    "get_shop_dashboard",
                    format!("Shop {shop_id} not found"),
                );
            }
            Err(error) => return store_failure("get_shop_dashboard", error),
        };

        let products = match self.products().list(Some(shop.id)).await {
            Ok(products) => products,
            Err(error) => return store_failure("get_shop_dashboard", error),
        };
        let orders = match self
            .orders()
            .list(OrderFilter { shop_id: Some(shop.id), ..OrderFilter::default() })
            .await
        {
            Ok(orders) => orders,
            Err(error) => return store_failure("get_shop_dashboard", error),
        };

        let pending_orders =
            orders.iter().filter(|order| order.status == OrderStatus::Pending).count();
        let revenue: Decimal = orders
            .iter()
            .filter(|order| order.status != OrderStatus::Cancelled)
            .map(|order| order.pricing.total_amount)
            .sum();
        let low_stock = products.iter().filter(|product| product.is_low_stock()).count();

        CommandResult::ok_with_data(
            "get_shop_dashboard",
            format!("Dashboard stats for '{}'", shop.name),
            json!({
                "shop_id": shop.id.0,
                "shop_name": shop.name,
                "total_products": products.len(),
                "total_orders": orders.len(),
                "pending_orders": pending_orders,
                "total_revenue": revenue,
                "low_stock_count": low_stock,
                "is_verified": shop.is_verified,
            }),
        )
    }

    pub(super) async fn get_shop_low_stock(&self, shop_id: i64) -> CommandResult {
        match self.find_shop(&EntityRef::Id(shop_id)).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return CommandResult::fail(
                    "get_shop_low_stock",
                    format!("Shop {shop_id} not found"),
                );
            }
            Err(failure) => return failure,
        }

        match self.products().low_stock(Some(ShopId(shop_id))).await {
            Ok(products) => CommandResult::ok_with_data(
                "get_shop_low_stock",
                format!("Found {} low stock products", products.len()),
                Value::Array(
                    products
                        .iter()
                        .map(|product| {
                            json!({
                                "id": product.id.0,
                                "name": product.name,
                                "sku": product.sku,
                                "quantity": product.quantity,
                                "min_stock_level": product.min_stock_level,
                            })
                        })
                        .collect(),
                ),
            ),
            Err(error) => store_failure("get_shop_low_stock", error),
        }
    }

    pub(super) async fn get_shop_orders(
        &self,
        shop_id: i64,
        status: Option<OrderStatus>,
    ) -> CommandResult {
        let filter =
            OrderFilter { shop_id: Some(ShopId(shop_id)), status, customer_email: None };

        match self.orders().list(filter).await {
            Ok(orders) => CommandResult::ok_with_data(
                "get_shop_orders",
                format!("Found {} orders", orders.len()),
                Value::Array(
                    orders
                        .iter()
                        .map(|order| {
                            json!({
                                "id": order.id.0,
                                "status": order.status,
                                "total": order.pricing.total_amount,
                                "customer": order.customer_name,
                                "product_name": order.product_name,
                                "created_at": order.created_at.to_rfc3339(),
                            })
                        })
                        .collect(),
                ),
            ),
            Err(error) => store_failure("get_shop_orders", error),
        }
    }
}
