use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use kirana_core::domain::category::{CategoryId, ShopCategory};
use kirana_core::stores::{CategoryStore, NewCategory, StoreError};

use super::db_error;
use crate::DbPool;

pub struct SqlCategoryStore {
    pool: DbPool,
}

impl SqlCategoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn category_from_row(row: &SqliteRow) -> Result<ShopCategory, StoreError> {
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(db_error)?;
    Ok(ShopCategory {
        id: CategoryId(row.try_get("id").map_err(db_error)?),
        name: row.try_get("name").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        icon: row.try_get("icon").map_err(db_error)?,
        created_at,
    })
}

#[async_trait]
impl CategoryStore for SqlCategoryStore {
    async fn create(&self, category: NewCategory) -> Result<ShopCategory, StoreError> {
        let result =
            sqlx::query("INSERT INTO shop_categories (name, description, icon) VALUES (?, ?, ?)")
                .bind(&category.name)
                .bind(&category.description)
                .bind(&category.icon)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;

        let id = CategoryId(result.last_insert_rowid());
        self.get(id).await?.ok_or_else(|| StoreError::not_found("shop category", id))
    }

    async fn get(&self, id: CategoryId) -> Result<Option<ShopCategory>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, description, icon, created_at FROM shop_categories WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<ShopCategory>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, description, icon, created_at FROM shop_categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(category_from_row).collect()
    }
}
