use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use kirana_core::stores::StoreError;

pub mod action_log;
pub mod category;
pub mod customer;
pub mod memory;
pub mod order;
pub mod product;
pub mod shop;
pub mod user;

pub use action_log::{ActionLogEntry, SqlActionLog};
pub use category::SqlCategoryStore;
pub use customer::SqlCustomerStore;
pub use memory::{
    InMemoryCategoryStore, InMemoryCustomerStore, InMemoryOrderStore, InMemoryProductStore,
    InMemoryShopStore, InMemoryUserStore,
};
pub use order::SqlOrderStore;
pub use product::SqlProductStore;
pub use shop::SqlShopStore;
pub use user::SqlUserStore;

pub(crate) fn db_error(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

pub(crate) fn decimal_column(row: &SqliteRow, name: &str) -> Result<Decimal, StoreError> {
    let raw: String = row.try_get(name).map_err(db_error)?;
    Decimal::from_str(&raw)
        .map_err(|error| StoreError::Backend(format!("invalid decimal in `{name}`: {error}")))
}

pub(crate) fn opt_decimal_column(
    row: &SqliteRow,
    name: &str,
) -> Result<Option<Decimal>, StoreError> {
    let raw: Option<String> = row.try_get(name).map_err(db_error)?;
    match raw {
        None => Ok(None),
        Some(raw) => Decimal::from_str(&raw).map(Some).map_err(|error| {
            StoreError::Backend(format!("invalid decimal in `{name}`: {error}"))
        }),
    }
}
