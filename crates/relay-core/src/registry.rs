//! Participant registry
//!
//! Owns name uniqueness and liveness bookkeeping. Every call goes straight
//! to the storage collaborator, so mutations are visible to the next read.

use crate::clock::Clock;
use crate::error::{RelayError, Result};
use crate::models::Participant;
use crate::storage::ChatStorage;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct ParticipantRegistry {
    storage: Arc<dyn ChatStorage>,
    clock: Arc<dyn Clock>,
}

impl ParticipantRegistry {
    pub fn new(storage: Arc<dyn ChatStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Register `name`, failing with `Conflict` if it is already taken.
    pub async fn register(&self, name: &str) -> Result<Participant> {
        let participant = Participant::new(name, self.clock.now());
        if !self.storage.insert_participant(participant.clone()).await? {
            return Err(RelayError::Conflict(name.to_string()));
        }
        info!("[Registry] Registered {}", name);
        Ok(participant)
    }

    /// Refresh `last_seen` for `name`.
    pub async fn heartbeat(&self, name: &str) -> Result<()> {
        if self.storage.touch_participant(name, self.clock.now()).await? {
            debug!("[Registry] Heartbeat from {}", name);
            Ok(())
        } else {
            Err(RelayError::NotFound(name.to_string()))
        }
    }

    pub async fn get(&self, name: &str) -> Result<Option<Participant>> {
        self.storage.get_participant(name).await
    }

    pub async fn list(&self) -> Result<Vec<Participant>> {
        self.storage.list_participants().await
    }

    /// Idempotent removal. Returns whether a participant was removed.
    pub async fn remove(&self, name: &str) -> Result<bool> {
        self.storage.remove_participant(name).await
    }

    /// Remove `name` only if it has not been seen since `observed`.
    pub async fn remove_if_unchanged(&self, name: &str, observed: DateTime<Utc>) -> Result<bool> {
        self.storage.remove_participant_if(name, observed).await
    }

    /// Participants whose `last_seen` is strictly older than `now - threshold`.
    pub async fn stale_since(&self, threshold: Duration) -> Result<Vec<Participant>> {
        let threshold = chrono::Duration::from_std(threshold)
            .map_err(|e| RelayError::validation(format!("threshold out of range: {e}")))?;
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(threshold)
            .ok_or_else(|| RelayError::validation("threshold reaches before the earliest timestamp"))?;
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|p| p.last_seen < cutoff)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;

    fn registry() -> (ParticipantRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let registry = ParticipantRegistry::new(Arc::new(MemoryStorage::new()), clock.clone());
        (registry, clock)
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let (registry, _) = registry();
        registry.register("alice").await.unwrap();
        let err = registry.register("alice").await.unwrap_err();
        assert!(matches!(err, RelayError::Conflict(name) if name == "alice"));
        assert_eq!(registry.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_heartbeat_updates_last_seen() {
        let (registry, clock) = registry();
        let created = registry.register("alice").await.unwrap();
        clock.advance(chrono::Duration::seconds(5));
        registry.heartbeat("alice").await.unwrap();

        let current = registry.get("alice").await.unwrap().unwrap();
        assert_eq!(current.last_seen - created.last_seen, chrono::Duration::seconds(5));
    }

    #[tokio::test]
    async fn test_heartbeat_unknown_is_not_found() {
        let (registry, _) = registry();
        assert!(matches!(
            registry.heartbeat("ghost").await,
            Err(RelayError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (registry, _) = registry();
        registry.register("alice").await.unwrap();
        assert!(registry.remove("alice").await.unwrap());
        assert!(!registry.remove("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_since_uses_strict_cutoff() {
        let (registry, clock) = registry();
        registry.register("old").await.unwrap();
        clock.advance(chrono::Duration::seconds(5));
        registry.register("edge").await.unwrap();
        clock.advance(chrono::Duration::seconds(5));
        registry.register("fresh").await.unwrap();
        clock.advance(chrono::Duration::seconds(1));

        // now = 11s; cutoff = 1s. "old" (0s) is stale, "edge" (5s) and "fresh" (10s) are not.
        let stale = registry.stale_since(Duration::from_secs(10)).await.unwrap();
        let names: Vec<_> = stale.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["old".to_string()]);

        // cutoff exactly at "edge" keeps it alive.
        let stale = registry.stale_since(Duration::from_secs(6)).await.unwrap();
        assert_eq!(stale.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_since_rejects_threshold_beyond_time_range() {
        let (registry, _) = registry();
        registry.register("alice").await.unwrap();
        let err = registry
            .stale_since(Duration::from_secs(9_000_000_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }
}
