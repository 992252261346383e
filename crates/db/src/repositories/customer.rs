use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use kirana_core::domain::customer::{Customer, CustomerId};
use kirana_core::stores::{CustomerStore, StoreError};

use super::{db_error, decimal_column};
use crate::DbPool;

pub struct SqlCustomerStore {
    pool: DbPool,
}

impl SqlCustomerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str =
    "id, name, email, phone, address, total_orders, total_spent, created_at";

fn customer_from_row(row: &SqliteRow) -> Result<Customer, StoreError> {
    let total_orders: i64 = row.try_get("total_orders").map_err(db_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(db_error)?;

    Ok(Customer {
        id: CustomerId(row.try_get("id").map_err(db_error)?),
        name: row.try_get("name").map_err(db_error)?,
        email: row.try_get("email").map_err(db_error)?,
        phone: row.try_get("phone").map_err(db_error)?,
        address: row.try_get("address").map_err(db_error)?,
        total_orders: total_orders.max(0) as u32,
        total_spent: decimal_column(row, "total_spent")?,
        created_at,
    })
}

#[async_trait]
impl CustomerStore for SqlCustomerStore {
    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM customers WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM customers ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.iter().map(customer_from_row).collect()
    }

    async fn search(&self, query: &str) -> Result<Vec<Customer>, StoreError> {
        let pattern = format!("%{}%", query.trim());
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers WHERE name LIKE ? OR email LIKE ? ORDER BY id"
        ))
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(customer_from_row).collect()
    }
}
