//! Append-only message log.

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{Message, NewMessage};
use crate::storage::ChatStorage;
use crate::visibility::is_visible;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct MessageStore {
    storage: Arc<dyn ChatStorage>,
    clock: Arc<dyn Clock>,
}

impl MessageStore {
    pub fn new(storage: Arc<dyn ChatStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Stamp `message` with the current time if it has none, store it and
    /// return the stored copy.
    pub async fn append(&self, message: NewMessage) -> Result<Message> {
        let message = message.into_message(self.clock.now());
        self.storage.append_message(message.clone()).await?;
        debug!(
            "[Messages] {} -> {} ({})",
            message.from, message.to, message.kind
        );
        Ok(message)
    }

    /// Every stored message, oldest first.
    pub async fn list_all(&self) -> Result<Vec<Message>> {
        self.storage.list_messages().await
    }

    /// Messages `viewer` may see, oldest first. A positive `limit` keeps only
    /// the most recent `limit` of them.
    pub async fn list_visible(&self, viewer: &str, limit: Option<i64>) -> Result<Vec<Message>> {
        let mut visible: Vec<Message> = self
            .list_all()
            .await?
            .into_iter()
            .filter(|m| is_visible(m, viewer))
            .collect();

        if let Some(limit) = limit.filter(|l| *l > 0) {
            let keep = usize::try_from(limit).unwrap_or(usize::MAX);
            if visible.len() > keep {
                visible.drain(..visible.len() - keep);
            }
        }
        Ok(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::MessageKind;
    use crate::storage::MemoryStorage;
    use crate::visibility::BROADCAST_TARGET;

    async fn seeded() -> MessageStore {
        let store = MessageStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualClock::default()),
        );
        for (from, to, text) in [
            ("A", BROADCAST_TARGET, "one"),
            ("A", "B", "two"),
            ("B", "C", "three"),
            ("C", BROADCAST_TARGET, "four"),
            ("B", "A", "five"),
        ] {
            store
                .append(NewMessage::new(from, to, text, MessageKind::Private))
                .await
                .unwrap();
        }
        store
    }

    fn texts(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_append_preserves_insertion_order() {
        let store = seeded().await;
        let all = store.list_all().await.unwrap();
        assert_eq!(texts(&all), vec!["one", "two", "three", "four", "five"]);
        assert!(all.iter().all(|m| m.time == "00:00:00"));
    }

    #[tokio::test]
    async fn test_list_visible_filters_by_viewer() {
        let store = seeded().await;
        let for_a = store.list_visible("A", None).await.unwrap();
        assert_eq!(texts(&for_a), vec!["one", "two", "four", "five"]);
        let for_c = store.list_visible("C", None).await.unwrap();
        assert_eq!(texts(&for_c), vec!["one", "three", "four"]);
    }

    #[tokio::test]
    async fn test_limit_keeps_most_recent() {
        let store = seeded().await;
        let last_two = store.list_visible("A", Some(2)).await.unwrap();
        assert_eq!(texts(&last_two), vec!["four", "five"]);

        let more_than_available = store.list_visible("C", Some(10)).await.unwrap();
        assert_eq!(more_than_available.len(), 3);
    }

    #[tokio::test]
    async fn test_non_positive_limit_returns_everything() {
        let store = seeded().await;
        assert_eq!(store.list_visible("A", Some(0)).await.unwrap().len(), 4);
        assert_eq!(store.list_visible("A", Some(-3)).await.unwrap().len(), 4);
    }
}
