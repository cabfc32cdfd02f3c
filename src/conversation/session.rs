use super::ConversationState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub type ChatId = i64;
pub type SessionSlot = Arc<Mutex<ConversationState>>;

/// In-flight conversations keyed by chat.
///
/// Each chat gets its own lock so events from one chat are handled one at a
/// time while other chats proceed independently.
///
/// Sessions are only dropped once they return to idle. A chat that walks
/// away mid-flow keeps its entry until it finishes the flow or sends
/// `/start` or `/cancel`; there is no idle expiry.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<ChatId, SessionSlot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chat's session, creating an idle one on first contact.
    pub async fn checkout(&self, chat: ChatId) -> SessionSlot {
        let mut sessions = self.inner.lock().await;
        Arc::clone(sessions.entry(chat).or_insert_with(|| {
            debug!(chat, "Session created");
            Arc::new(Mutex::new(ConversationState::Idle))
        }))
    }

    /// Drops the chat's session once it is idle and nobody else holds it.
    pub async fn release(&self, chat: ChatId, slot: SessionSlot) {
        let mut sessions = self.inner.lock().await;
        // one reference in the map, one held by the caller
        if Arc::strong_count(&slot) > 2 {
            return;
        }
        let idle = slot.try_lock().map(|s| s.is_idle()).unwrap_or(false);
        let current = sessions
            .get(&chat)
            .is_some_and(|existing| Arc::ptr_eq(existing, &slot));
        if idle && current {
            sessions.remove(&chat);
            debug!(chat, "Session discarded");
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_checkout_reuses_session() {
        let store = SessionStore::new();

        let slot = store.checkout(1).await;
        *slot.lock().await = ConversationState::AwaitingAmount;

        let again = store.checkout(1).await;
        assert!(Arc::ptr_eq(&slot, &again));
        assert_eq!(*again.lock().await, ConversationState::AwaitingAmount);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_per_chat() {
        let store = SessionStore::new();

        *store.checkout(1).await.lock().await = ConversationState::AwaitingAmount;
        assert_eq!(*store.checkout(2).await.lock().await, ConversationState::Idle);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_release_discards_idle_session() {
        let store = SessionStore::new();

        let slot = store.checkout(1).await;
        store.release(1, slot).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_release_keeps_active_session() {
        let store = SessionStore::new();

        let slot = store.checkout(1).await;
        *slot.lock().await = ConversationState::AwaitingAmount;
        store.release(1, slot).await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_abandoned_session_lives_until_cancelled() {
        let store = SessionStore::new();

        let slot = store.checkout(1).await;
        *slot.lock().await = ConversationState::AwaitingAmount;
        store.release(1, slot).await;

        let slot = store.checkout(1).await;
        assert_eq!(*slot.lock().await, ConversationState::AwaitingAmount);
        store.release(1, slot).await;
        assert_eq!(store.len().await, 1);

        let slot = store.checkout(1).await;
        *slot.lock().await = ConversationState::Idle;
        store.release(1, slot).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_release_keeps_session_shared_with_pending_event() {
        let store = SessionStore::new();

        let first = store.checkout(1).await;
        let _second = store.checkout(1).await;
        store.release(1, first).await;
        assert_eq!(store.len().await, 1);
    }
}
