use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use kirana_core::domain::shop::{Shop, ShopId};
use kirana_core::stores::{NewShop, ShopFilter, ShopPatch, ShopStore, StoreError};

use super::{db_error, decimal_column, opt_decimal_column};
use crate::DbPool;

pub struct SqlShopStore {
    pool: DbPool,
}

impl SqlShopStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, name, description, category_id, owner_name, owner_email, \
                              owner_phone, address, city, pincode, gst_number, is_verified, \
                              is_active, rating, total_orders, total_revenue, created_at";

pub(crate) fn shop_from_row(row: &SqliteRow) -> Result<Shop, StoreError> {
    let total_orders: i64 = row.try_get("total_orders").map_err(db_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(db_error)?;

    Ok(Shop {
        id: ShopId(row.try_get("id").map_err(db_error)?),
        name: row.try_get("name").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        category_id: row.try_get("category_id").map_err(db_error)?,
        owner_name: row.try_get("owner_name").map_err(db_error)?,
        owner_email: row.try_get("owner_email").map_err(db_error)?,
        owner_phone: row.try_get("owner_phone").map_err(db_error)?,
        address: row.try_get("address").map_err(db_error)?,
        city: row.try_get("city").map_err(db_error)?,
        pincode: row.try_get("pincode").map_err(db_error)?,
        gst_number: row.try_get("gst_number").map_err(db_error)?,
        is_verified: row.try_get("is_verified").map_err(db_error)?,
        is_active: row.try_get("is_active").map_err(db_error)?,
        rating: opt_decimal_column(row, "rating")?,
        total_orders: total_orders.max(0) as u32,
        total_revenue: decimal_column(row, "total_revenue")?,
        created_at,
    })
}

#[async_trait]
impl ShopStore for SqlShopStore {
    async fn create(&self, shop: NewShop) -> Result<Shop, StoreError> {
        let result = sqlx::query(
            "INSERT INTO shops (name, description, category_id, owner_name, owner_email, \
             owner_phone, address, city, pincode, gst_number) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&shop.name)
        .bind(&shop.description)
        .bind(shop.category_id)
        .bind(&shop.owner_name)
        .bind(&shop.owner_email)
        .bind(&shop.owner_phone)
        .bind(&shop.address)
        .bind(&shop.city)
        .bind(&shop.pincode)
        .bind(&shop.gst_number)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let id = ShopId(result.last_insert_rowid());
        self.get(id).await?.ok_or_else(|| StoreError::not_found("shop", id))
    }

    async fn get(&self, id: ShopId) -> Result<Option<Shop>, StoreError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM shops WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(shop_from_row).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Shop>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM shops WHERE name = ? COLLATE NOCASE LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.as_ref().map(shop_from_row).transpose()
    }

    async fn list(&self, filter: ShopFilter) -> Result<Vec<Shop>, StoreError> {
        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM shops WHERE 1 = 1");
        if filter.category_id.is_some() {
            sql.push_str(" AND category_id = ?");
        }
        if filter.city.is_some() {
            sql.push_str(" AND city = ? COLLATE NOCASE");
        }
        if filter.search.is_some() {
            sql.push_str(" AND (name LIKE ? OR description LIKE ?)");
        }
        if filter.is_verified.is_some() {
            sql.push_str(" AND is_verified = ?");
        }
        if filter.is_active.is_some() {
            sql.push_str(" AND is_active = ?");
        }
        sql.push_str(" ORDER BY id");

        let pattern = filter.search.as_ref().map(|search| format!("%{}%", search.trim()));
        let mut query = sqlx::query(&sql);
        if let Some(category_id) = filter.category_id {
            query = query.bind(category_id);
        }
        if let Some(city) = &filter.city {
            query = query.bind(city);
        }
        if let Some(pattern) = &pattern {
            query = query.bind(pattern).bind(pattern);
        }
        if let Some(is_verified) = filter.is_verified {
            query = query.bind(is_verified);
        }
        if let Some(is_active) = filter.is_active {
            query = query.bind(is_active);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(shop_from_row).collect()
    }

    async fn update(&self, id: ShopId, patch: ShopPatch) -> Result<Option<Shop>, StoreError> {
        let Some(current) = self.get(id).await? else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE shops SET name = ?, description = ?, address = ?, city = ?, pincode = ? \
             WHERE id = ?",
        )
        .bind(patch.name.unwrap_or(current.name))
        .bind(patch.description.or(current.description))
        .bind(patch.address.or(current.address))
        .bind(patch.city.or(current.city))
        .bind(patch.pincode.or(current.pincode))
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        self.get(id).await
    }

    async fn delete(&self, id: ShopId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM shops WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_verified(&self, id: ShopId, verified: bool) -> Result<Option<Shop>, StoreError> {
        let result = sqlx::query("UPDATE shops SET is_verified = ? WHERE id = ?")
            .bind(verified)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn set_active(&self, id: ShopId, active: bool) -> Result<Option<Shop>, StoreError> {
        let result = sqlx::query("UPDATE shops SET is_active = ? WHERE id = ?")
            .bind(active)
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
