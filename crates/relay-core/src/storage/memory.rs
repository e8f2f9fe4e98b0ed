//! In-process storage backend.

use super::ChatStorage;
use crate::error::Result;
use crate::models::{Message, Participant};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Storage kept entirely in memory; state is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    participants: RwLock<HashMap<String, Participant>>,
    messages: RwLock<Vec<Message>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStorage for MemoryStorage {
    async fn insert_participant(&self, participant: Participant) -> Result<bool> {
        let mut map = self.participants.write();
        if map.contains_key(&participant.name) {
            return Ok(false);
        }
        map.insert(participant.name.clone(), participant);
        Ok(true)
    }

    async fn get_participant(&self, name: &str) -> Result<Option<Participant>> {
        Ok(self.participants.read().get(name).cloned())
    }

    async fn list_participants(&self) -> Result<Vec<Participant>> {
        Ok(self.participants.read().values().cloned().collect())
    }

    async fn touch_participant(&self, name: &str, at: DateTime<Utc>) -> Result<bool> {
        match self.participants.write().get_mut(name) {
            Some(p) => {
                p.last_seen = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_participant(&self, name: &str) -> Result<bool> {
        Ok(self.participants.write().remove(name).is_some())
    }

    async fn remove_participant_if(&self, name: &str, observed: DateTime<Utc>) -> Result<bool> {
        let mut map = self.participants.write();
        match map.get(name) {
            Some(p) if p.last_seen == observed => {
                map.remove(name);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_message(&self, message: Message) -> Result<()> {
        self.messages.write().push(message);
        Ok(())
    }

    async fn list_messages(&self) -> Result<Vec<Message>> {
        Ok(self.messages.read().clone())
    }
}
