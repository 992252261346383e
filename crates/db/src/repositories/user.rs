use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use kirana_core::domain::shop::ShopId;
use kirana_core::domain::user::{User, UserId, UserRole};
use kirana_core::stores::{StoreError, UserStore};

use super::db_error;
use crate::DbPool;

pub struct SqlUserStore {
    pool: DbPool,
}

impl SqlUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, name, email, role, phone, shop_id, is_active, created_at";

fn user_from_row(row: &SqliteRow) -> Result<User, StoreError> {
    let role_raw: String = row.try_get("role").map_err(db_error)?;
    let role = UserRole::parse(&role_raw)
        .ok_or_else(|| StoreError::Backend(format!("invalid user role `{role_raw}`")))?;
    let shop_id: Option<i64> = row.try_get("shop_id").map_err(db_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(db_error)?;

    Ok(User {
        id: UserId(row.try_get("id").map_err(db_error)?),
        name: row.try_get("name").map_err(db_error)?,
        email: row.try_get("email").map_err(db_error)?,
        role,
        phone: row.try_get("phone").map_err(db_error)?,
        shop_id: shop_id.map(ShopId),
        is_active: row.try_get("is_active").map_err(db_error)?,
        created_at,
    })
}

#[async_trait]
impl UserStore for SqlUserStore {
    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM users WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self, role: Option<UserRole>) -> Result<Vec<User>, StoreError> {
        let rows = match role {
            Some(role) => {
                sqlx::query(&format!(
                    "SELECT {SELECT_COLUMNS} FROM users WHERE role = ? ORDER BY id"
                ))
                .bind(role.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM users ORDER BY id"))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_error)?;
        rows.iter().map(user_from_row).collect()
    }
}
