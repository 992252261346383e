use serde_json::Value;

use kirana_core::stores::StoreError;

use super::db_error;
use crate::DbPool;

/// Append-only record of every resolved command and its outcome. Written by
/// the server after execution completes; the executor itself never touches
/// this table.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionLogEntry {
    pub conversation_id: Option<String>,
    pub user_input: String,
    pub parsed_intent: Value,
    pub action_taken: Option<String>,
    pub status: Option<String>,
    pub result: Option<Value>,
}

pub struct SqlActionLog {
    pool: DbPool,
}

impl SqlActionLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, entry: ActionLogEntry) -> Result<i64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO action_log \
             (conversation_id, user_input, parsed_intent, action_taken, status, result) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.conversation_id)
        .bind(&entry.user_input)
        .bind(entry.parsed_intent.to_string())
        .bind(&entry.action_taken)
        .bind(&entry.status)
        .bind(entry.result.map(|value| value.to_string()))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM action_log")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }
}
