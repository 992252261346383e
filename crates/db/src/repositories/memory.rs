//! In-memory store implementations.
//!
//! Critical-path fakes for executor and runtime tests: same trait contracts
//! as the SQL stores, including the atomic stock movement on order creation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use async_trait::async_trait;
use kirana_core::domain::category::{CategoryId, ShopCategory};
use kirana_core::domain::customer::{Customer, CustomerId};
use kirana_core::domain::order::{Order, OrderId, OrderStatus};
use kirana_core::domain::product::{Product, ProductId};
use kirana_core::domain::shop::{Shop, ShopId};
use kirana_core::domain::user::{User, UserId, UserRole};
use kirana_core::stores::{
    CategoryStore, CustomerStore, NewCategory, NewOrder, NewProduct, NewShop, OrderFilter,
    OrderStore, ProductPatch, ProductStore, ShopFilter, ShopPatch, ShopStore, StoreError,
    UserStore,
};

#[derive(Debug)]
struct Table<T> {
    next_id: i64,
    rows: HashMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: HashMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    inner: Arc<RwLock<Table<Product>>>,
}

impl InMemoryProductStore {
    pub async fn insert(&self, product: Product) {
        let mut table = self.inner.write().await;
        table.next_id = table.next_id.max(product.id.0);
        table.rows.insert(product.id.0, product);
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn create(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut table = self.inner.write().await;
        let id = table.allocate();
        let row = Product {
            id: ProductId(id),
            shop_id: product.shop_id,
            name: product.name,
            description: product.description,
            sku: product.sku,
            price: product.price,
            cost_price: product.cost_price,
            min_price: product.min_price,
            quantity: product.quantity,
            sold_count: 0,
            min_stock_level: product.min_stock_level,
            is_active: true,
            created_at: Utc::now(),
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.inner.read().await.rows.get(&id.0).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        let table = self.inner.read().await;
        Ok(table.rows.values().find(|p| p.name.eq_ignore_ascii_case(name)).cloned())
    }

    async fn list(&self, shop_id: Option<ShopId>) -> Result<Vec<Product>, StoreError> {
        let table = self.inner.read().await;
        let mut products: Vec<Product> = table
            .rows
            .values()
            .filter(|p| shop_id.is_none() || p.shop_id == shop_id)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id.0);
        Ok(products)
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Product>, StoreError> {
        let needle = query.trim().to_lowercase();
        let table = self.inner.read().await;
        let mut products: Vec<Product> = table
            .rows
            .values()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description
                        .as_deref()
                        .map(|d| d.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id.0);
        products.truncate(limit as usize);
        Ok(products)
    }

    async fn low_stock(&self, shop_id: Option<ShopId>) -> Result<Vec<Product>, StoreError> {
        let table = self.inner.read().await;
        let mut products: Vec<Product> = table
            .rows
            .values()
            .filter(|p| (shop_id.is_none() || p.shop_id == shop_id) && p.is_low_stock())
            .cloned()
            .collect();
        products.sort_by_key(|p| p.quantity);
        Ok(products)
    }

    async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, StoreError> {
        let mut table = self.inner.write().await;
        let Some(product) = table.rows.get_mut(&id.0) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = Some(description);
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(cost_price) = patch.cost_price {
            product.cost_price = Some(cost_price);
        }
        if let Some(min_price) = patch.min_price {
            product.min_price = Some(min_price);
        }
        if let Some(quantity) = patch.quantity {
            product.quantity = quantity;
        }
        if let Some(is_active) = patch.is_active {
            product.is_active = is_active;
        }
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.rows.remove(&id.0).is_some())
    }

    async fn restock(&self, id: ProductId, quantity: u32) -> Result<Option<Product>, StoreError> {
        let mut table = self.inner.write().await;
        let Some(product) = table.rows.get_mut(&id.0) else {
            return Ok(None);
        };
        product.quantity += quantity;
        Ok(Some(product.clone()))
    }
}

#[derive(Clone)]
pub struct InMemoryOrderStore {
    inner: Arc<RwLock<Table<Order>>>,
    products: InMemoryProductStore,
}

impl InMemoryOrderStore {
    pub fn new(products: InMemoryProductStore) -> Self {
        Self { inner: Arc::new(RwLock::new(Table::default())), products }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_priced(&self, order: NewOrder) -> Result<Order, StoreError> {
        // Stock movement first, holding the product table lock for the whole
        // check-and-decrement.
        {
            let mut products = self.products.inner.write().await;
            let Some(product) = products.rows.get_mut(&order.product_id.0) else {
                return Err(StoreError::not_found("product", order.product_id));
            };
            if product.quantity < order.quantity {
                return Err(StoreError::InsufficientStock {
                    available: product.quantity,
                    requested: order.quantity,
                });
            }
            product.quantity -= order.quantity;
            product.sold_count += order.quantity;
        }

        let mut table = self.inner.write().await;
        let id = table.allocate();
        let row = Order {
            id: OrderId(id),
            shop_id: order.shop_id,
            product_id: Some(order.product_id),
            product_name: order.product_name,
            quantity: order.quantity,
            pricing: order.pricing,
            status: OrderStatus::Pending,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            delivery_address: order.delivery_address,
            created_at: Utc::now(),
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.inner.read().await.rows.get(&id.0).cloned())
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError> {
        let table = self.inner.read().await;
        let mut orders: Vec<Order> = table
            .rows
            .values()
            .filter(|o| filter.shop_id.is_none() || o.shop_id == filter.shop_id)
            .filter(|o| filter.status.is_none() || Some(o.status) == filter.status)
            .filter(|o| {
                filter.customer_email.is_none()
                    || o.customer_email.as_deref() == filter.customer_email.as_deref()
            })
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.id.0);
        Ok(orders)
    }

    async fn list_for_day(
        &self,
        shop_id: Option<ShopId>,
        day: chrono::NaiveDate,
    ) -> Result<Vec<Order>, StoreError> {
        let table = self.inner.read().await;
        let mut orders: Vec<Order> = table
            .rows
            .values()
            .filter(|o| shop_id.is_none() || o.shop_id == shop_id)
            .filter(|o| o.created_at.date_naive() == day)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.id.0);
        Ok(orders)
    }

    async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut table = self.inner.write().await;
        let Some(order) = table.rows.get_mut(&id.0) else {
            return Ok(None);
        };
        order.status = status;
        Ok(Some(order.clone()))
    }

    async fn set_quantity(&self, id: OrderId, quantity: u32) -> Result<Option<Order>, StoreError> {
        let mut table = self.inner.write().await;
        let Some(order) = table.rows.get_mut(&id.0) else {
            return Ok(None);
        };

        let qty = Decimal::from(quantity);
        order.quantity = quantity;
        order.pricing.total_amount = order.pricing.unit_price * qty;
        order.pricing.total_cost = order.pricing.cost_price.map(|cost| cost * qty);
        order.pricing.profit =
            order.pricing.total_cost.map(|cost| order.pricing.total_amount - cost);
        order.pricing.discount_given =
            (order.pricing.listed_price - order.pricing.final_price) * qty;
        Ok(Some(order.clone()))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryShopStore {
    inner: Arc<RwLock<Table<Shop>>>,
}

impl InMemoryShopStore {
    pub async fn insert(&self, shop: Shop) {
        let mut table = self.inner.write().await;
        table.next_id = table.next_id.max(shop.id.0);
        table.rows.insert(shop.id.0, shop);
    }
}

#[async_trait]
impl ShopStore for InMemoryShopStore {
    async fn create(&self, shop: NewShop) -> Result<Shop, StoreError> {
        let mut table = self.inner.write().await;
        let id = table.allocate();
        let row = Shop {
            id: ShopId(id),
            name: shop.name,
            description: shop.description,
            category_id: shop.category_id,
            owner_name: shop.owner_name,
            owner_email: shop.owner_email,
            owner_phone: shop.owner_phone,
            address: shop.address,
            city: shop.city,
            pincode: shop.pincode,
            gst_number: shop.gst_number,
            is_verified: false,
            is_active: true,
            rating: None,
            total_orders: 0,
            total_revenue: Decimal::ZERO,
            created_at: Utc::now(),
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: ShopId) -> Result<Option<Shop>, StoreError> {
        Ok(self.inner.read().await.rows.get(&id.0).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Shop>, StoreError> {
        let table = self.inner.read().await;
        Ok(table.rows.values().find(|s| s.name.eq_ignore_ascii_case(name)).cloned())
    }

    async fn list(&self, filter: ShopFilter) -> Result<Vec<Shop>, StoreError> {
        let needle = filter.search.as_ref().map(|s| s.trim().to_lowercase());
        let table = self.inner.read().await;
        let mut shops: Vec<Shop> = table
            .rows
            .values()
            .filter(|s| filter.category_id.is_none() || s.category_id == filter.category_id)
            .filter(|s| {
                filter.city.is_none()
                    || s.city
                        .as_deref()
                        .map(|city| {
                            city.eq_ignore_ascii_case(filter.city.as_deref().unwrap_or_default())
                        })
                        .unwrap_or(false)
            })
            .filter(|s| {
                needle
                    .as_ref()
                    .map(|needle| s.name.to_lowercase().contains(needle))
                    .unwrap_or(true)
            })
            .filter(|s| filter.is_verified.is_none() || Some(s.is_verified) == filter.is_verified)
            .filter(|s| filter.is_active.is_none() || Some(s.is_active) == filter.is_active)
            .cloned()
            .collect();
        shops.sort_by_key(|s| s.id.0);
        Ok(shops)
    }

    async fn update(&self, id: ShopId, patch: ShopPatch) -> Result<Option<Shop>, StoreError> {
        let mut table = self.inner.write().await;
        let Some(shop) = table.rows.get_mut(&id.0) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            shop.name = name;
        }
        if let Some(description) = patch.description {
            shop.description = Some(description);
        }
        if let Some(address) = patch.address {
            shop.address = Some(address);
        }
        if let Some(city) = patch.city {
            shop.city = Some(city);
        }
        if let Some(pincode) = patch.pincode {
            shop.pincode = Some(pincode);
        }
        Ok(Some(shop.clone()))
    }

    async fn delete(&self, id: ShopId) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.rows.remove(&id.0).is_some())
    }

    async fn set_verified(&self, id: ShopId, verified: bool) -> Result<Option<Shop>, StoreError> {
        let mut table = self.inner.write().await;
        let Some(shop) = table.rows.get_mut(&id.0) else {
            return Ok(None);
        };
        shop.is_verified = verified;
        Ok(Some(shop.clone()))
    }

    async fn set_active(&self, id: ShopId, active: bool) -> Result<Option<Shop>, StoreError> {
        let mut table = self.inner.write().await;
        let Some(shop) = table.rows.get_mut(&id.0) else {
            return Ok(None);
        };
        shop.is_active = active;
        Ok(Some(shop.clone()))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCustomerStore {
    inner: Arc<RwLock<Table<Customer>>>,
}

impl InMemoryCustomerStore {
    pub async fn insert(&self, customer: Customer) {
        let mut table = self.inner.write().await;
        table.next_id = table.next_id.max(customer.id.0);
        table.rows.insert(customer.id.0, customer);
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        Ok(self.inner.read().await.rows.get(&id.0).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        let table = self.inner.read().await;
        Ok(table.rows.values().find(|c| c.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn list(&self) -> Result<Vec<Customer>, StoreError> {
        let table = self.inner.read().await;
        let mut customers: Vec<Customer> = table.rows.values().cloned().collect();
        customers.sort_by_key(|c| c.id.0);
        Ok(customers)
    }

    async fn search(&self, query: &str) -> Result<Vec<Customer>, StoreError> {
        let needle = query.trim().to_lowercase();
        let table = self.inner.read().await;
        let mut customers: Vec<Customer> = table
            .rows
            .values()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle) || c.email.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        customers.sort_by_key(|c| c.id.0);
        Ok(customers)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    inner: Arc<RwLock<Table<User>>>,
}

impl InMemoryUserStore {
    pub async fn insert(&self, user: User) {
        let mut table = self.inner.write().await;
        table.next_id = table.next_id.max(user.id.0);
        table.rows.insert(user.id.0, user);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.rows.get(&id.0).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.inner.read().await;
        Ok(table.rows.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn list(&self, role: Option<UserRole>) -> Result<Vec<User>, StoreError> {
        let table = self.inner.read().await;
        let mut users: Vec<User> = table
            .rows
            .values()
            .filter(|u| role.is_none() || Some(u.role) == role)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.id.0);
        Ok(users)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCategoryStore {
    inner: Arc<RwLock<Table<ShopCategory>>>,
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn create(&self, category: NewCategory) -> Result<ShopCategory, StoreError> {
        let mut table = self.inner.write().await;
        let id = table.allocate();
        let row = ShopCategory {
            id: CategoryId(id),
            name: category.name,
            description: category.description,
            icon: category.icon,
            created_at: Utc::now(),
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: CategoryId) -> Result<Option<ShopCategory>, StoreError> {
        Ok(self.inner.read().await.rows.get(&id.0).cloned())
    }

    async fn list(&self) -> Result<Vec<ShopCategory>, StoreError> {
        let table = self.inner.read().await;
        let mut categories: Vec<ShopCategory> = table.rows.values().cloned().collect();
        categories.sort_by_key(|c| c.id.0);
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use kirana_core::billing::pricing::PricingSnapshot;
    use kirana_core::stores::{NewOrder, NewProduct, OrderStore, ProductStore, StoreError};

    use super::{InMemoryOrderStore, InMemoryProductStore};

    fn new_product(quantity: u32) -> NewProduct {
        NewProduct {
            name: "Tata Salt 1kg".to_string(),
            price: Decimal::new(2_800, 2),
            cost_price: Some(Decimal::new(2_200, 2)),
            quantity,
            min_stock_level: 5,
            ..NewProduct::default()
        }
    }

    fn new_order(product_id: kirana_core::domain::product::ProductId, quantity: u32) -> NewOrder {
        NewOrder {
            shop_id: None,
            product_id,
            product_name: "Tata Salt 1kg".to_string(),
            quantity,
            pricing: PricingSnapshot {
                cost_price: Some(Decimal::new(2_200, 2)),
                listed_price: Decimal::new(2_800, 2),
                final_price: Decimal::new(2_800, 2),
                unit_price: Decimal::new(2_800, 2),
                total_amount: Decimal::new(2_800, 2) * Decimal::from(quantity),
                total_cost: Some(Decimal::new(2_200, 2) * Decimal::from(quantity)),
                profit: Some(Decimal::new(600, 2) * Decimal::from(quantity)),
                discount_given: Decimal::ZERO,
            },
            customer_name: "Walk-in Customer".to_string(),
            customer_email: None,
            customer_phone: None,
            delivery_address: None,
        }
    }

    #[tokio::test]
    async fn order_creation_commits_stock_movement() {
        let products = InMemoryProductStore::default();
        let orders = InMemoryOrderStore::new(products.clone());

        let product = products.create(new_product(10)).await.expect("create product");
        let order = orders.create_priced(new_order(product.id, 3)).await.expect("create order");

        assert_eq!(order.quantity, 3);
        let updated = products.get(product.id).await.expect("get").expect("present");
        assert_eq!(updated.quantity, 7);
        assert_eq!(updated.sold_count, 3);
    }

    #[tokio::test]
    async fn order_creation_rejects_short_stock_without_side_effects() {
        let products = InMemoryProductStore::default();
        let orders = InMemoryOrderStore::new(products.clone());

        let product = products.create(new_product(2)).await.expect("create product");
        let error = orders
            .create_priced(new_order(product.id, 5))
            .await
            .expect_err("short stock must fail");

        assert!(matches!(error, StoreError::InsufficientStock { available: 2, requested: 5 }));
        let untouched = products.get(product.id).await.expect("get").expect("present");
        assert_eq!(untouched.quantity, 2);
        assert_eq!(untouched.sold_count, 0);
    }

    #[tokio::test]
    async fn set_quantity_rescales_snapshot_from_fixed_unit_prices() {
        let products = InMemoryProductStore::default();
        let orders = InMemoryOrderStore::new(products.clone());

        let product = products.create(new_product(10)).await.expect("create product");
        let order = orders.create_priced(new_order(product.id, 1)).await.expect("create order");

        let updated = orders
            .set_quantity(order.id, 4)
            .await
            .expect("set quantity")
            .expect("order present");

        assert_eq!(updated.quantity, 4);
        assert_eq!(updated.pricing.total_amount, Decimal::new(11_200, 2));
        assert_eq!(updated.pricing.profit, Some(Decimal::new(2_400, 2)));
        assert_eq!(updated.pricing.unit_price, order.pricing.unit_price);
    }
}
