use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use kirana_core::command::ResolvedIntent;

/// Holds intents awaiting confirmation, keyed by single-use opaque token.
///
/// Shared (`Arc`) across every executor instance so a token minted while
/// handling one request is visible to the `confirm` call of a later request.
/// Entries expire after a fixed window; `take` removes atomically, so a token
/// is usable at most once.
pub struct PendingConfirmationStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, Pending>>,
}

struct Pending {
    intent: ResolvedIntent,
    expires_at: DateTime<Utc>,
}

impl PendingConfirmationStore {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: RwLock::new(HashMap::new()) }
    }

    /// Store the intent and mint a fresh token for it.
    pub async fn issue(&self, intent: ResolvedIntent) -> String {
        let token = Uuid::new_v4().to_string();
        let expires_at =
            Utc::now() + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());

        let mut entries = self.entries.write().await;
        let now = Utc::now();
        entries.retain(|_, pending| pending.expires_at > now);
        entries.insert(token.clone(), Pending { intent, expires_at });

        token
    }

    /// Consume a token. Returns the held intent exactly once; `None` for
    /// tokens that were never issued, already consumed, or expired.
    pub async fn take(&self, token: &str) -> Option<ResolvedIntent> {
        let mut entries = self.entries.write().await;
        let pending = entries.remove(token)?;
        (pending.expires_at > Utc::now()).then_some(pending.intent)
    }

    pub async fn pending_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for PendingConfirmationStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kirana_core::command::ResolvedIntent;

    use super::PendingConfirmationStore;

    #[tokio::test]
    async fn tokens_are_unique_and_single_use() {
        let store = PendingConfirmationStore::default();
        let first = store.issue(ResolvedIntent::new("delete_product")).await;
        let second = store.issue(ResolvedIntent::new("delete_shop")).await;
        assert_ne!(first, second);

        let held = store.take(&first).await.expect("first take succeeds");
        assert_eq!(held.action, "delete_product");
        assert!(store.take(&first).await.is_none(), "second take must fail");
    }

    #[tokio::test]
    async fn unknown_tokens_yield_nothing() {
        let store = PendingConfirmationStore::default();
        assert!(store.take("not-a-token").await.is_none());
    }

    #[tokio::test]
    async fn expired_tokens_are_not_honoured() {
        let store = PendingConfirmationStore::new(Duration::ZERO);
        let token = store.issue(ResolvedIntent::new("cancel_order")).await;
        assert!(store.take(&token).await.is_none());
    }

    #[tokio::test]
    async fn issuing_sweeps_expired_entries() {
        let store = PendingConfirmationStore::new(Duration::ZERO);
        store.issue(ResolvedIntent::new("cancel_order")).await;
        store.issue(ResolvedIntent::new("cancel_order")).await;
        assert_eq!(store.pending_count().await, 1);
    }
}
