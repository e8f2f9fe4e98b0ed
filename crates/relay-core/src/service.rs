//! Chat service
//!
//! The only entry point the transport layer talks to. Composes the
//! participant registry, the message store and the eviction sweeper.

use crate::clock::{Clock, SystemClock};
use crate::config::PresenceConfig;
use crate::error::{RelayError, Result};
use crate::messages::MessageStore;
use crate::models::{Message, MessageKind, NewMessage, Participant, JOIN_NOTICE};
use crate::registry::ParticipantRegistry;
use crate::storage::{ChatStorage, MemoryStorage};
use crate::sweeper::EvictionSweeper;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Registered and the join notice was posted.
    Joined { participant: Participant, notice: Message },
    /// Registered, but the join notice could not be stored.
    NoticeFailed { participant: Participant, error: String },
}

impl JoinOutcome {
    pub fn into_participant(self) -> Participant {
        match self {
            JoinOutcome::Joined { participant, .. } | JoinOutcome::NoticeFailed { participant, .. } => {
                participant
            }
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    registry: ParticipantRegistry,
    messages: MessageStore,
    config: PresenceConfig,
}

impl ChatService {
    pub fn new(storage: Arc<dyn ChatStorage>, clock: Arc<dyn Clock>, config: PresenceConfig) -> Self {
        Self {
            registry: ParticipantRegistry::new(storage.clone(), clock.clone()),
            messages: MessageStore::new(storage, clock),
            config,
        }
    }

    /// Service over fresh in-memory storage and the system clock.
    pub fn in_memory(config: PresenceConfig) -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(SystemClock), config)
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    pub fn messages(&self) -> &MessageStore {
        &self.messages
    }

    /// Sweeper bound to this service's registry and message store.
    pub fn sweeper(&self) -> EvictionSweeper {
        EvictionSweeper::new(
            self.registry.clone(),
            self.messages.clone(),
            self.config.clone(),
        )
    }

    pub async fn list_participants(&self) -> Result<Vec<Participant>> {
        self.registry.list().await
    }

    /// Register `name` and announce it to the room.
    ///
    /// Registration either happens or is rejected with `Conflict`; the join
    /// notice is best effort and never rolls the registration back.
    pub async fn join_room(&self, name: &str) -> Result<JoinOutcome> {
        require_non_empty("name", name)?;

        let participant = self.registry.register(name).await?;

        match self.messages.append(NewMessage::status(name, JOIN_NOTICE)).await {
            Ok(notice) => {
                info!("[Chat] {} joined", name);
                Ok(JoinOutcome::Joined {
                    participant,
                    notice,
                })
            }
            Err(e) => {
                warn!("[Chat] {} joined but the join notice failed: {}", name, e);
                Ok(JoinOutcome::NoticeFailed {
                    participant,
                    error: e.to_string(),
                })
            }
        }
    }

    pub async fn send_heartbeat(&self, name: &str) -> Result<()> {
        self.registry.heartbeat(name).await
    }

    /// Post a client message. Status messages are reserved for the system.
    pub async fn post_message(
        &self,
        from: &str,
        to: &str,
        text: &str,
        kind: MessageKind,
    ) -> Result<Message> {
        require_non_empty("from", from)?;
        require_non_empty("to", to)?;
        require_non_empty("text", text)?;
        if !kind.is_client_postable() {
            return Err(RelayError::validation(format!(
                "type must be \"message\" or \"private_message\", got {:?}",
                kind.as_str()
            )));
        }

        if self.registry.get(from).await?.is_none() {
            return Err(RelayError::NotFound(from.to_string()));
        }

        self.messages
            .append(NewMessage::new(from, to, text, kind))
            .await
    }

    pub async fn list_messages(&self, viewer: &str, limit: Option<i64>) -> Result<Vec<Message>> {
        self.messages.list_visible(viewer, limit).await
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RelayError::validation(format!("\"{field}\" is not allowed to be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::visibility::BROADCAST_TARGET;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    /// Memory storage whose message log is unavailable.
    #[derive(Default)]
    struct BrokenMessageLog {
        inner: MemoryStorage,
    }

    #[async_trait]
    impl ChatStorage for BrokenMessageLog {
        async fn insert_participant(&self, p: Participant) -> Result<bool> {
            self.inner.insert_participant(p).await
        }
        async fn get_participant(&self, name: &str) -> Result<Option<Participant>> {
            self.inner.get_participant(name).await
        }
        async fn list_participants(&self) -> Result<Vec<Participant>> {
            self.inner.list_participants().await
        }
        async fn touch_participant(&self, name: &str, at: DateTime<Utc>) -> Result<bool> {
            self.inner.touch_participant(name, at).await
        }
        async fn remove_participant(&self, name: &str) -> Result<bool> {
            self.inner.remove_participant(name).await
        }
        async fn remove_participant_if(&self, name: &str, observed: DateTime<Utc>) -> Result<bool> {
            self.inner.remove_participant_if(name, observed).await
        }
        async fn append_message(&self, _message: Message) -> Result<()> {
            Err(RelayError::StorageFailure("down".into()))
        }
        async fn list_messages(&self) -> Result<Vec<Message>> {
            self.inner.list_messages().await
        }
    }

    fn service() -> ChatService {
        ChatService::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualClock::default()),
            PresenceConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_join_posts_notice() {
        let chat = service();
        let JoinOutcome::Joined { participant, notice } = chat.join_room("alice").await.unwrap()
        else {
            panic!("expected the join notice to be stored");
        };
        assert_eq!(participant.name, "alice");
        assert_eq!(notice.kind, MessageKind::Status);
        assert_eq!(notice.to, BROADCAST_TARGET);
        assert_eq!(notice.text, JOIN_NOTICE);
    }

    #[tokio::test]
    async fn test_failed_join_notice_keeps_registration() {
        let chat = ChatService::new(
            Arc::new(BrokenMessageLog::default()),
            Arc::new(ManualClock::default()),
            PresenceConfig::default(),
        );

        let JoinOutcome::NoticeFailed { participant, error } = chat.join_room("alice").await.unwrap()
        else {
            panic!("expected the join notice to fail");
        };
        assert_eq!(participant.name, "alice");
        assert!(error.contains("down"));

        let names: Vec<String> = chat
            .list_participants()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["alice".to_string()]);
        assert!(matches!(
            chat.join_room("alice").await,
            Err(RelayError::Conflict(name)) if name == "alice"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_join_is_rejected_without_side_effects() {
        let chat = service();
        chat.join_room("alice").await.unwrap();
        let err = chat.join_room("alice").await.unwrap_err();
        assert!(matches!(err, RelayError::Conflict(_)));

        assert_eq!(chat.list_participants().await.unwrap().len(), 1);
        assert_eq!(chat.messages().list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_join_requires_a_name() {
        let chat = service();
        for name in ["", "   "] {
            assert!(matches!(
                chat.join_room(name).await,
                Err(RelayError::Validation(_))
            ));
        }
        assert!(chat.list_participants().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_rejects_status_kind() {
        let chat = service();
        chat.join_room("alice").await.unwrap();
        let err = chat
            .post_message("alice", BROADCAST_TARGET, "fake leave", MessageKind::Status)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
        assert_eq!(chat.messages().list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_post_from_unknown_sender_is_not_found() {
        let chat = service();
        let err = chat
            .post_message("mallory", "bob", "hi", MessageKind::Private)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::NotFound(name) if name == "mallory"));
    }

    #[tokio::test]
    async fn test_post_validates_before_sender_lookup() {
        let chat = service();
        let err = chat
            .post_message("mallory", "bob", "", MessageKind::Private)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_heartbeat_unknown_is_not_found() {
        let chat = service();
        assert!(matches!(
            chat.send_heartbeat("ghost").await,
            Err(RelayError::NotFound(_))
        ));
    }
}
