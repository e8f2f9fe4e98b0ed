//! JSON file storage backend
//!
//! Each collection is a JSON document under `<dir>/app/`, rewritten
//! atomically (temp file + rename) after every mutation. A mutation that
//! fails to persist is rolled back in memory, so callers never observe a
//! record that is not on disk.

use super::{ChatStorage, MESSAGES_COLLECTION, NAMESPACE, PARTICIPANTS_COLLECTION};
use crate::error::{RelayError, Result};
use crate::models::{Message, Participant};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct JsonFileStorage {
    root: PathBuf,
    participants: Mutex<HashMap<String, Participant>>,
    messages: Mutex<Vec<Message>>,
}

impl JsonFileStorage {
    /// Open (or create) the store rooted at `dir`, loading existing collections.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let root = dir.into().join(NAMESPACE);
        fs::create_dir_all(&root).await?;

        let participants: Vec<Participant> =
            load_collection(&collection_path(&root, PARTICIPANTS_COLLECTION)).await?;
        let messages: Vec<Message> =
            load_collection(&collection_path(&root, MESSAGES_COLLECTION)).await?;

        info!(
            "[Storage] Opened {:?} ({} participants, {} messages)",
            root,
            participants.len(),
            messages.len()
        );

        Ok(Self {
            participants: Mutex::new(
                participants
                    .into_iter()
                    .map(|p| (p.name.clone(), p))
                    .collect(),
            ),
            messages: Mutex::new(messages),
            root,
        })
    }

    /// Directory holding the collection files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn persist_participants(&self, map: &HashMap<String, Participant>) -> Result<()> {
        let mut list: Vec<&Participant> = map.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        write_atomic(&collection_path(&self.root, PARTICIPANTS_COLLECTION), &list).await
    }

    async fn persist_messages(&self, messages: &[Message]) -> Result<()> {
        write_atomic(&collection_path(&self.root, MESSAGES_COLLECTION), &messages).await
    }
}

fn collection_path(root: &Path, collection: &str) -> PathBuf {
    root.join(format!("{}.json", collection))
}

async fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !fs::try_exists(path).await? {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| {
        RelayError::StorageFailure(format!("failed to parse {:?}: {}", path, e))
    })
}

async fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&temp_path, json).await?;
    fs::rename(&temp_path, path).await?;
    debug!("[Storage] Wrote {:?}", path);
    Ok(())
}

#[async_trait]
impl ChatStorage for JsonFileStorage {
    async fn insert_participant(&self, participant: Participant) -> Result<bool> {
        let mut map = self.participants.lock().await;
        if map.contains_key(&participant.name) {
            return Ok(false);
        }
        let name = participant.name.clone();
        map.insert(name.clone(), participant);
        if let Err(e) = self.persist_participants(&map).await {
            map.remove(&name);
            return Err(e);
        }
        Ok(true)
    }

    async fn get_participant(&self, name: &str) -> Result<Option<Participant>> {
        Ok(self.participants.lock().await.get(name).cloned())
    }

    async fn list_participants(&self) -> Result<Vec<Participant>> {
        Ok(self.participants.lock().await.values().cloned().collect())
    }

    async fn touch_participant(&self, name: &str, at: DateTime<Utc>) -> Result<bool> {
        let mut map = self.participants.lock().await;
        let previous = match map.get_mut(name) {
            Some(p) => std::mem::replace(&mut p.last_seen, at),
            None => return Ok(false),
        };
        if let Err(e) = self.persist_participants(&map).await {
            if let Some(p) = map.get_mut(name) {
                p.last_seen = previous;
            }
            return Err(e);
        }
        Ok(true)
    }

    async fn remove_participant(&self, name: &str) -> Result<bool> {
        let mut map = self.participants.lock().await;
        let Some(removed) = map.remove(name) else {
            return Ok(false);
        };
        if let Err(e) = self.persist_participants(&map).await {
            map.insert(removed.name.clone(), removed);
            return Err(e);
        }
        Ok(true)
    }

    async fn remove_participant_if(&self, name: &str, observed: DateTime<Utc>) -> Result<bool> {
        let mut map = self.participants.lock().await;
        match map.get(name) {
            Some(p) if p.last_seen == observed => {}
            _ => return Ok(false),
        }
        let Some(removed) = map.remove(name) else {
            return Ok(false);
        };
        if let Err(e) = self.persist_participants(&map).await {
            map.insert(removed.name.clone(), removed);
            return Err(e);
        }
        Ok(true)
    }

    async fn append_message(&self, message: Message) -> Result<()> {
        let mut messages = self.messages.lock().await;
        messages.push(message);
        if let Err(e) = self.persist_messages(&messages).await {
            messages.pop();
            return Err(e);
        }
        Ok(())
    }

    async fn list_messages(&self) -> Result<Vec<Message>> {
        Ok(self.messages.lock().await.clone())
    }
}
