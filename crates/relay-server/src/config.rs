//! Relay server configuration

use anyhow::{Context, Result};
use relay_core::{ChatService, ChatStorage, JsonFileStorage, MemoryStorage, PresenceConfig, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Configuration for the relay server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Directory for the JSON-file store; in-memory storage when unset
    pub data_dir: Option<PathBuf>,
    /// Sweeper timing
    pub presence: PresenceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            data_dir: None,
            presence: PresenceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment (after `.env`).
    ///
    /// `PORT` (or `PORTA`), `RELAY_DATA_DIR`, `SWEEP_INTERVAL_SECS`,
    /// `INACTIVITY_THRESHOLD_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT").or_else(|| lookup("PORTA")) {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid port {:?}", port))?;
        }

        config.data_dir = lookup("RELAY_DATA_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        if let Some(secs) = parse_secs(&lookup, "SWEEP_INTERVAL_SECS")? {
            config.presence.sweep_interval = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "INACTIVITY_THRESHOLD_SECS")? {
            config.presence.inactivity_threshold = secs;
        }

        config
            .presence
            .validate()
            .context("invalid SWEEP_INTERVAL_SECS or INACTIVITY_THRESHOLD_SECS")?;

        Ok(config)
    }

    /// Build the chat service over the configured storage backend.
    pub async fn build_service(&self) -> Result<ChatService> {
        let storage: Arc<dyn ChatStorage> = match &self.data_dir {
            Some(dir) => {
                info!("Storage: JSON files under {:?}", dir);
                Arc::new(
                    JsonFileStorage::open(dir.clone())
                        .await
                        .context("Failed to open JSON storage")?,
                )
            }
            None => {
                info!("Storage: in-memory");
                Arc::new(MemoryStorage::new())
            }
        };
        Ok(ChatService::new(
            storage,
            Arc::new(SystemClock),
            self.presence.clone(),
        ))
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("invalid {}: {:?}", key, raw))
        })
        .transpose()
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: ChatService,
}

impl AppState {
    pub fn new(chat: ChatService) -> Self {
        Self { chat }
    }
}
