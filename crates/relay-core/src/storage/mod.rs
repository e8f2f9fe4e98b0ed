//! Storage collaborator for the relay.
//!
//! All state lives in two collections of the `app` namespace:
//! `participants` (keyed by name) and `messages` (append-only).
//! Backends guard each collection with its own lock, so registry
//! mutations and message appends are serialized independently.

pub mod json;
pub mod memory;

pub use json::JsonFileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;
use crate::models::{Message, Participant};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Logical namespace holding both collections.
pub const NAMESPACE: &str = "app";
pub const PARTICIPANTS_COLLECTION: &str = "participants";
pub const MESSAGES_COLLECTION: &str = "messages";

/// Abstraction over the backing store for participants and messages.
#[async_trait]
pub trait ChatStorage: Send + Sync + 'static {
    /// Insert `participant` unless one with the same name exists.
    /// Returns `false` when the name was already taken.
    async fn insert_participant(&self, participant: Participant) -> Result<bool>;

    async fn get_participant(&self, name: &str) -> Result<Option<Participant>>;

    async fn list_participants(&self) -> Result<Vec<Participant>>;

    /// Set `last_seen` for an existing participant. Returns `false` if unknown.
    async fn touch_participant(&self, name: &str, at: DateTime<Utc>) -> Result<bool>;

    async fn remove_participant(&self, name: &str) -> Result<bool>;

    /// Remove `name` only if its stored `last_seen` still equals `observed`.
    async fn remove_participant_if(&self, name: &str, observed: DateTime<Utc>) -> Result<bool>;

    async fn append_message(&self, message: Message) -> Result<()>;

    /// All messages in insertion order, oldest first.
    async fn list_messages(&self) -> Result<Vec<Message>>;
}
