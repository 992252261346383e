use rust_decimal::Decimal;
use serde_json::{json, Value};

use kirana_core::catalog::{CreateProduct, EntityRef, UpdateProduct};
use kirana_core::command::CommandResult;
use kirana_core::domain::product::{Product, ProductId};
use kirana_core::domain::shop::ShopId;
use kirana_core::stores::{NewProduct, ProductPatch};

use super::{store_failure, ActionExecutor};

fn product_row(product: &Product) -> Value {
    json!({
        "id": product.id.0,
        "name": product.name,
        "price": product.price,
        "quantity": product.quantity,
    })
}

impl ActionExecutor {
    pub(super) async fn create_product(&self, payload: CreateProduct) -> CommandResult {
        let new_product = NewProduct {
            shop_id: payload.shop_id.map(ShopId),
            name: payload.name,
            description: payload.description,
            sku: payload.sku,
            price: payload.price,
            cost_price: payload.cost_price,
            min_price: payload.min_price,
            quantity: payload.quantity,
            min_stock_level: 5,
        };

        match self.products().create(new_product).await {
            Ok(product) => CommandResult::ok_with_data(
                "create_product",
                format!("Created product '{}' with ID {}", product.name, product.id),
                product_row(&product),
            ),
            Err(error) => store_failure("create_product", error),
        }
    }

    pub(super) async fn update_product(&self, payload: UpdateProduct) -> CommandResult {
        let product_id = ProductId(payload.product_id);
        let patch = ProductPatch {
            name: payload.name,
            description: payload.description,
            price: payload.price,
            cost_price: payload.cost_price,
            min_price: payload.min_price,
            quantity: payload.quantity,
            is_active: payload.is_active,
        };

        match self.products().update(product_id, patch).await {
            Ok(Some(product)) => CommandResult::ok_with_data(
                "update_product",
                format!("Updated product {}", product.id),
                product_row(&product),
            ),
            Ok(None) => CommandResult::fail(
                "update_product",
                format!("Product {product_id} not found"),
            ),
            Err(error) => store_failure("update_product", error),
        }
    }

    pub(super) async fn delete_product(&self, product_id: i64) -> CommandResult {
        match self.products().delete(ProductId(product_id)).await {
            Ok(true) => {
                CommandResult::ok("delete_product", format!("Deleted product {product_id}"))
            }
            Ok(false) => CommandResult::fail(
                "delete_product",
                format!("Product {product_id} not found"),
            ),
            Err(error) => store_failure("delete_product", error),
        }
    }

    pub(super) async fn list_products(
        &self,
        shop_id: Option<i64>,
        search: Option<String>,
    ) -> CommandResult {
        let result = match &search {
            Some(query) => self.products().search(query, 100).await,
            None => self.products().list(shop_id.map(ShopId)).await,
        };

        match result {
            Ok(products) => CommandResult::ok_with_data(
                "list_products",
                format!("Found {} products", products.len()),
                Value::Array(products.iter().map(product_row).collect()),
            ),
            Err(error) => store_failure("list_products", error),
        }
    }

    pub(super) async fn get_product(&self, target: EntityRef) -> CommandResult {
        let found = match &target {
            EntityRef::Id(id) => self.products().get(ProductId(*id)).await,
            EntityRef::Name(name) => self.products().get_by_name(name).await,
        };

        match found {
            Ok(Some(product)) => CommandResult::ok_with_data(
                "get_product",
                format!("Found product: {}", product.name),
                product_row(&product),
            ),
            Ok(None) => CommandResult::fail("get_product", "Product not found"),
            Err(error) => store_failure("get_product", error),
        }
    }

    pub(super) async fn search_products(&self, query: String, limit: u32) -> CommandResult {
        match self.products().search(&query, limit).await {
            Ok(products) => CommandResult::ok_with_data(
                "search_products",
                format!("Found {} products matching '{query}'", products.len()),
                Value::Array(products.iter().map(product_row).collect()),
            ),
            Err(error) => store_failure("search_products", error),
        }
    }

    pub(super) async fn get_low_stock(&self, shop_id: Option<i64>) -> CommandResult {
        match self.products().low_stock(shop_id.map(ShopId)).await {
            Ok(products) => CommandResult::ok_with_data(
                "get_low_stock",
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
            Err(error) => store_failure("get_low_stock", error),
        }
    }

    pub(super) async fn restock_product(&self, product_id: i64, quantity: u32) -> CommandResult {
        if quantity == 0 {
            return CommandResult::fail(
                "restock_product",
                "Quantity must be a positive number",
            );
        }

        match self.products().restock(ProductId(product_id), quantity).await {
            Ok(Some(product)) => CommandResult::ok_with_data(
                "restock_product",
                format!(
                    "Added {quantity} units to '{}'. New stock: {}",
                    product.name, product.quantity
                ),
                product_row(&product),
            ),
            Ok(None) => CommandResult::fail(
                "restock_product",
                format!("Product {product_id} not found"),
            ),
            Err(error) => store_failure("restock_product", error),
        }
    }

    pub(super) async fn set_product_price(
        &self,
        product_id: i64,
        price: Decimal,
    ) -> CommandResult {
        if price < Decimal::ZERO {
            return CommandResult::fail(
                "set_product_price",
                "Price must be a valid positive number",
            );
        }

        let current = match self.products().get(ProductId(product_id)).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                return CommandResult::fail(
                    "set_product_price",
                    format!("Product {product_id} not found"),
                );
            }
            Err(error) => return store_failure("set_product_price", error),
        };

        let old_price = current.price;
        let patch = ProductPatch { price: Some(price), ..ProductPatch::default() };
        match self.products().update(current.id, patch).await {
            Ok(Some(product)) => CommandResult::ok_with_data(
                "set_product_price",
                format!("Updated '{}' price from ₹{old_price} to ₹{price}", product.name),
                json!({
                    "id": product.id.0,
                    "name": product.name,
                    "old_price": old_price,
                    "new_price": price,
                }),
            ),
            Ok(None) => CommandResult::fail(
                "set_product_price",
                format!("Product {product_id} not found"),
            ),
            Err(error) => store_failure("set_product_price", error),
        }
    }
}
