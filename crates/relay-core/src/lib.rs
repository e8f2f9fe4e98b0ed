//! relay-core: presence lifecycle and message visibility for the chat relay.
//!
//! - **registry**: participants and their last heartbeat; name uniqueness.
//! - **messages**: append-only message log with per-viewer reads.
//! - **visibility**: which messages a viewer may see.
//! - **sweeper**: periodic eviction of silent participants.
//! - **service**: the facade the transport layer calls.
//! - **storage**: the injected backing store (in-memory or JSON files).

pub mod clock;
pub mod config;
pub mod error;
pub mod messages;
pub mod models;
pub mod registry;
pub mod service;
pub mod storage;
pub mod sweeper;
pub mod visibility;

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::PresenceConfig;
pub use crate::error::{RelayError, Result};
pub use crate::messages::MessageStore;
pub use crate::models::{Message, MessageKind, NewMessage, Participant, JOIN_NOTICE, LEAVE_NOTICE};
pub use crate::registry::ParticipantRegistry;
pub use crate::service::{ChatService, JoinOutcome};
pub use crate::storage::{ChatStorage, JsonFileStorage, MemoryStorage};
pub use crate::sweeper::{EvictionOutcome, EvictionSweeper, SweepReport};
pub use crate::visibility::{is_visible, BROADCAST_TARGET};
