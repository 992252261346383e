use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use kirana_core::billing::pricing::PricingSnapshot;
use kirana_core::domain::order::{Order, OrderId, OrderStatus};
use kirana_core::domain::product::ProductId;
use kirana_core::domain::shop::ShopId;
use kirana_core::stores::{NewOrder, OrderFilter, OrderStore, StoreError};

use super::{db_error, decimal_column, opt_decimal_column};
use crate::DbPool;

pub struct SqlOrderStore {
    pool: DbPool,
}

impl SqlOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, shop_id, product_id, product_name, quantity, cost_price, \
                              listed_price, final_price, unit_price, total_amount, total_cost, \
                              profit, discount_given, status, customer_name, customer_email, \
                              customer_phone, delivery_address, created_at";

pub(crate) fn order_from_row(row: &SqliteRow) -> Result<Order, StoreError> {
    let shop_id: Option<i64> = row.try_get("shop_id").map_err(db_error)?;
    let product_id: Option<i64> = row.try_get("product_id").map_err(db_error)?;
    let quantity: i64 = row.try_get("quantity").map_err(db_error)?;
    let status_raw: String = row.try_get("status").map_err(db_error)?;
    let status = OrderStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::Backend(format!("invalid order status `{status_raw}`")))?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(db_error)?;

    Ok(Order {
        id: OrderId(row.try_get("id").map_err(db_error)?),
        shop_id: shop_id.map(ShopId),
        product_id: product_id.map(ProductId),
        product_name: row.try_get("product_name").map_err(db_error)?,
        quantity: quantity.max(0) as u32,
        pricing: PricingSnapshot {
            cost_price: opt_decimal_column(row, "cost_price")?,
            listed_price: decimal_column(row, "listed_price")?,
            final_price: decimal_column(row, "final_price")?,
            unit_price: decimal_column(row, "unit_price")?,
            total_amount: decimal_column(row, "total_amount")?,
            total_cost: opt_decimal_column(row, "total_cost")?,
            profit: opt_decimal_column(row, "profit")?,
            discount_given: decimal_column(row, "discount_given")?,
        },
        status,
        customer_name: row.try_get("customer_name").map_err(db_error)?,
        customer_email: row.try_get("customer_email").map_err(db_error)?,
        customer_phone: row.try_get("customer_phone").map_err(db_error)?,
        delivery_address: row.try_get("delivery_address").map_err(db_error)?,
        created_at,
    })
}

#[async_trait]
impl OrderStore for SqlOrderStore {
    async fn create_priced(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // Re-check availability inside the transaction; the pricing engine
        // already validated it against a possibly stale read.
        let stock: Option<i64> = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?")
            .bind(order.product_id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;

        let Some(available) = stock else {
            return Err(StoreError::not_found("product", order.product_id));
        };
        if available < i64::from(order.quantity) {
            return Err(StoreError::InsufficientStock {
                available: available.max(0) as u32,
                requested: order.quantity,
            });
        }

        sqlx::query(
            "UPDATE products SET quantity = quantity - ?, sold_count = sold_count + ? WHERE id = ?",
        )
        .bind(i64::from(order.quantity))
        .bind(i64::from(order.quantity))
        .bind(order.product_id.0)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        let pricing = &order.pricing;
        let result = sqlx::query(
            "INSERT INTO orders (shop_id, product_id, product_name, quantity, cost_price, \
             listed_price, final_price, unit_price, total_amount, total_cost, profit, \
             discount_given, status, customer_name, customer_email, customer_phone, \
             delivery_address) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.shop_id.map(|id| id.0))
        .bind(order.product_id.0)
        .bind(&order.product_name)
        .bind(i64::from(order.quantity))
        .bind(pricing.cost_price.map(|value| value.to_string()))
        .bind(pricing.listed_price.to_string())
        .bind(pricing.final_price.to_string())
        .bind(pricing.unit_price.to_string())
        .bind(pricing.total_amount.to_string())
        .bind(pricing.total_cost.map(|value| value.to_string()))
        .bind(pricing.profit.map(|value| value.to_string()))
        .bind(pricing.discount_given.to_string())
        .bind(OrderStatus::Pending.as_str())
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(&order.delivery_address)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        let id = OrderId(result.last_insert_rowid());
        tx.commit().await.map_err(db_error)?;

        self.get(id).await?.ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM orders WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError> {
        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM orders WHERE 1 = 1");
        if filter.shop_id.is_some() {
            sql.push_str(" AND shop_id = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.customer_email.is_some() {
            sql.push_str(" AND customer_email = ?");
        }
        sql.push_str(" ORDER BY id");

        let mut query = sqlx::query(&sql);
        if let Some(shop_id) = filter.shop_id {
            query = query.bind(shop_id.0);
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(customer_email) = &filter.customer_email {
            query = query.bind(customer_email);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(order_from_row).collect()
    }

    async fn list_for_day(
        &self,
        shop_id: Option<ShopId>,
        day: NaiveDate,
    ) -> Result<Vec<Order>, StoreError> {
        let day = day.format("%Y-%m-%d").to_string();
        let rows = match shop_id {
            Some(shop_id) => {
                sqlx::query(&format!(
                    "SELECT {SELECT_COLUMNS} FROM orders \
                     WHERE shop_id = ? AND date(created_at) = ? ORDER BY id"
                ))
                .bind(shop_id.0)
                .bind(&day)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {SELECT_COLUMNS} FROM orders WHERE date(created_at) = ? ORDER BY id"
                ))
                .bind(&day)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_error)?;

        rows.iter().map(order_from_row).collect()
    }

    async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn set_quantity(&self, id: OrderId, quantity: u32) -> Result<Option<Order>, StoreError> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };

        let qty = Decimal::from(quantity);
        let total_amount = order.pricing.unit_price * qty;
        let total_cost = order.pricing.cost_price.map(|cost| cost * qty);
        let profit = total_cost.map(|cost| total_amount - cost);
        let discount_given = (order.pricing.listed_price - order.pricing.final_price) * qty;

        sqlx::query(
            "UPDATE orders SET quantity = ?, total_amount = ?, total_cost = ?, profit = ?, \
             discount_given = ? WHERE id = ?",
        )
        .bind(i64::from(quantity))
        .bind(total_amount.to_string())
        .bind(total_cost.map(|value| value.to_string()))
        .bind(profit.map(|value| value.to_string()))
        .bind(discount_given.to_string())
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        self.get(id).await
    }
}
