//! Narrow async interfaces to the relational store.
//!
//! The executor only ever talks to these traits; `kirana-db` provides the
//! SQLite implementations and in-memory fakes for tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::billing::pricing::PricingSnapshot;
use crate::domain::category::{CategoryId, ShopCategory};
use crate::domain::customer::{Customer, CustomerId};
use crate::domain::order::{Order, OrderId, OrderStatus};
use crate::domain::product::{Product, ProductId};
use crate::domain::shop::{Shop, ShopId};
use crate::domain::user::{User, UserId, UserRole};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: u32, requested: u32 },
    #[error("backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewProduct {
    pub shop_id: Option<ShopId>,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub quantity: u32,
    pub min_stock_level: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub quantity: Option<u32>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create(&self, product: NewProduct) -> Result<Product, StoreError>;
    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
    async fn get_by_name(&self, name: &str) -> Result<Option<Product>, StoreError>;
    async fn list(&self, shop_id: Option<ShopId>) -> Result<Vec<Product>, StoreError>;
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Product>, StoreError>;
    async fn low_stock(&self, shop_id: Option<ShopId>) -> Result<Vec<Product>, StoreError>;
    async fn update(&self, id: ProductId, patch: ProductPatch)
        -> Result<Option<Product>, StoreError>;
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;
    /// Add stock; returns the updated product or None when absent.
    async fn restock(&self, id: ProductId, quantity: u32) -> Result<Option<Product>, StoreError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub shop_id: Option<ShopId>,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub pricing: PricingSnapshot,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub shop_id: Option<ShopId>,
    pub status: Option<OrderStatus>,
    pub customer_email: Option<String>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order and commit its stock movement atomically: the
    /// product's quantity is decremented and its sold counter incremented in
    /// the same transaction, re-checking availability.
    async fn create_priced(&self, order: NewOrder) -> Result<Order, StoreError>;
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;
    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError>;
    async fn list_for_day(
        &self,
        shop_id: Option<ShopId>,
        day: NaiveDate,
    ) -> Result<Vec<Order>, StoreError>;
    /// Persist an already-validated status transition.
    async fn set_status(&self, id: OrderId, status: OrderStatus)
        -> Result<Option<Order>, StoreError>;
    /// Change the quantity of a pending order, rescaling the stored snapshot
    /// totals from its fixed unit prices.
    async fn set_quantity(&self, id: OrderId, quantity: u32)
        -> Result<Option<Order>, StoreError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewShop {
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
pub struct ShopPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShopFilter {
    pub category_id: Option<i64>,
    pub city: Option<String>,
    pub search: Option<String>,
    pub is_verified: Option<bool>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait ShopStore: Send + Sync {
    async fn create(&self, shop: NewShop) -> Result<Shop, StoreError>;
    async fn get(&self, id: ShopId) -> Result<Option<Shop>, StoreError>;
    async fn get_by_name(&self, name: &str) -> Result<Option<Shop>, StoreError>;
    async fn list(&self, filter: ShopFilter) -> Result<Vec<Shop>, StoreError>;
    async fn update(&self, id: ShopId, patch: ShopPatch) -> Result<Option<Shop>, StoreError>;
    async fn delete(&self, id: ShopId) -> Result<bool, StoreError>;
    async fn set_verified(&self, id: ShopId, verified: bool)
        -> Result<Option<Shop>, StoreError>;
    async fn set_active(&self, id: ShopId, active: bool) -> Result<Option<Shop>, StoreError>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError>;
    async fn list(&self) -> Result<Vec<Customer>, StoreError>;
    async fn search(&self, query: &str) -> Result<Vec<Customer>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn list(&self, role: Option<UserRole>) -> Result<Vec<User>, StoreError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn create(&self, category: NewCategory) -> Result<ShopCategory, StoreError>;
    async fn get(&self, id: CategoryId) -> Result<Option<ShopCategory>, StoreError>;
    async fn list(&self) -> Result<Vec<ShopCategory>, StoreError>;
}
