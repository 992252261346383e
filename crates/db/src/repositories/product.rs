use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use kirana_core::domain::product::{Product, ProductId};
use kirana_core::domain::shop::ShopId;
use kirana_core::stores::{NewProduct, ProductPatch, ProductStore, StoreError};

use super::{db_error, decimal_column, opt_decimal_column};
use crate::DbPool;

pub struct SqlProductStore {
    pool: DbPool,
}

impl SqlProductStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn product_from_row(row: &SqliteRow) -> Result<Product, StoreError> {
    let shop_id: Option<i64> = row.try_get("shop_id").map_err(db_error)?;
    let quantity: i64 = row.try_get("quantity").map_err(db_error)?;
    let sold_count: i64 = row.try_get("sold_count").map_err(db_error)?;
    let min_stock_level: i64 = row.try_get("min_stock_level").map_err(db_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(db_error)?;

    Ok(Product {
        id: ProductId(row.try_get("id").map_err(db_error)?),
        shop_id: shop_id.map(ShopId),
        name: row.try_get("name").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        sku: row.try_get("sku").map_err(db_error)?,
        price: decimal_column(row, "price")?,
        cost_price: opt_decimal_column(row, "cost_price")?,
        min_price: opt_decimal_column(row, "min_price")?,
        quantity: quantity.max(0) as u32,
        sold_count: sold_count.max(0) as u32,
        min_stock_level: min_stock_level.max(0) as u32,
        is_active: row.try_get("is_active").map_err(db_error)?,
        created_at,
    })
}

const SELECT_COLUMNS: &str = "id, shop_id, name, description, sku, price, cost_price, min_price, \
                              quantity, sold_count, min_stock_level, is_active, created_at";

#[async_trait]
impl ProductStore for SqlProductStore {
    async fn create(&self, product: NewProduct) -> Result<Product, StoreError> {
        let result = sqlx::query(
            "INSERT INTO products \
             (shop_id, name, description, sku, price, cost_price, min_price, quantity, min_stock_level) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(product.shop_id.map(|id| id.0))
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(product.price.to_string())
        .bind(product.cost_price.map(|value| value.to_string()))
        .bind(product.min_price.map(|value| value.to_string()))
        .bind(i64::from(product.quantity))
        .bind(i64::from(product.min_stock_level))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let id = ProductId(result.last_insert_rowid());
        self.get(id).await?.ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM products WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE name = ? COLLATE NOCASE LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn list(&self, shop_id: Option<ShopId>) -> Result<Vec<Product>, StoreError> {
        let rows = match shop_id {
            Some(shop_id) => {
                sqlx::query(&format!(
                    "SELECT {SELECT_COLUMNS} FROM products WHERE shop_id = ? ORDER BY id"
                ))
                .bind(shop_id.0)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM products ORDER BY id"))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_error)?;

        rows.iter().map(product_from_row).collect()
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Product>, StoreError> {
        let pattern = format!("%{}%", query.trim());
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM products \
             WHERE name LIKE ? OR description LIKE ? ORDER BY id LIMIT ?"
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(product_from_row).collect()
    }

    async fn low_stock(&self, shop_id: Option<ShopId>) -> Result<Vec<Product>, StoreError> {
        let base = format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE quantity <= min_stock_level"
        );
        let rows = match shop_id {
            Some(shop_id) => {
                sqlx::query(&format!("{base} AND shop_id = ? ORDER BY quantity"))
                    .bind(shop_id.0)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query(&format!("{base} ORDER BY quantity")).fetch_all(&self.pool).await
            }
        }
        .map_err(db_error)?;

        rows.iter().map(product_from_row).collect()
    }

    async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, StoreError> {
        let Some(current) = self.get(id).await? else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE products SET name = ?, description = ?, price = ?, cost_price = ?, \
             min_price = ?, quantity = ?, is_active = ? WHERE id = ?",
        )
        .bind(patch.name.unwrap_or(current.name))
        .bind(patch.description.or(current.description))
        .bind(patch.price.unwrap_or(current.price).to_string())
        .bind(patch.cost_price.or(current.cost_price).map(|value| value.to_string()))
        .bind(patch.min_price.or(current.min_price).map(|value| value.to_string()))
        .bind(i64::from(patch.quantity.unwrap_or(current.quantity)))
        .bind(patch.is_active.unwrap_or(current.is_active))
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        self.get(id).await
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn restock(&self, id: ProductId, quantity: u32) -> Result<Option<Product>, StoreError> {
        let result = sqlx::query("UPDATE products SET quantity = quantity + ? WHERE id = ?")
            .bind(i64::from(quantity))
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }
}
