use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

/// Per-conversation key-value carryover ("that product", "the last order").
///
/// Keyed by conversation id and TTL-bounded so abandoned sessions age out
/// instead of accumulating. Expired entries are dropped on access and pruned
/// on writes.
pub struct ContextStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, ContextEntry>>,
}

struct ContextEntry {
    values: Map<String, Value>,
    expires_at: DateTime<Utc>,
}

impl ContextStore {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: RwLock::new(HashMap::new()) }
    }

    fn deadline(&self) -> DateTime<Utc> {
        Utc::now() + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero())
    }

    /// Current context for a conversation; empty when absent or expired.
    pub async fn snapshot(&self, conversation_id: &str) -> Map<String, Value> {
        let entries = self.entries.read().await;
        match entries.get(conversation_id) {
            Some(entry) if entry.expires_at > Utc::now() => entry.values.clone(),
            _ => Map::new(),
        }
    }

    /// Merge keys into a conversation's context, refreshing its TTL.
    pub async fn remember<I>(&self, conversation_id: &str, values: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        entries.retain(|_, entry| entry.expires_at > now);

        let entry = entries
            .entry(conversation_id.to_string())
            .or_insert_with(|| ContextEntry { values: Map::new(), expires_at: now });
        entry.expires_at = self.deadline();
        for (key, value) in values {
            entry.values.insert(key, value);
        }
    }

    pub async fn clear(&self, conversation_id: &str) {
        self.entries.write().await.remove(conversation_id);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::ContextStore;

    #[tokio::test]
    async fn context_is_scoped_per_conversation() {
        let store = ContextStore::default();
        store
            .remember("conv-a", [("last_entity_id".to_string(), json!(7))])
            .await;

        let a = store.snapshot("conv-a").await;
        let b = store.snapshot("conv-b").await;

        assert_eq!(a.get("last_entity_id"), Some(&json!(7)));
        assert!(b.is_empty());
    }

    #[tokio::test]
    async fn remember_merges_and_overwrites_keys() {
        let store = ContextStore::default();
        store
            .remember(
                "conv",
                [
                    ("last_entity_id".to_string(), json!(1)),
                    ("last_entity_type".to_string(), json!("product")),
                ],
            )
            .await;
        store.remember("conv", [("last_entity_id".to_string(), json!(2))]).await;

        let snapshot = store.snapshot("conv").await;
        assert_eq!(snapshot.get("last_entity_id"), Some(&json!(2)));
        assert_eq!(snapshot.get("last_entity_type"), Some(&json!("product")));
    }

    #[tokio::test]
    async fn expired_entries_are_invisible_and_pruned() {
        let store = ContextStore::new(Duration::ZERO);
        store.remember("conv", [("key".to_string(), json!("value"))]).await;

        assert!(store.snapshot("conv").await.is_empty());

        // The next write sweeps the dead entry out of the map entirely.
        store.remember("other", [("key".to_string(), json!("value"))]).await;
        assert_eq!(store.len().await, 1);
    }
}
