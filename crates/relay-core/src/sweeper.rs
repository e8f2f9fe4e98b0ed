//! Eviction sweeper
//!
//! Periodically scans the registry for participants that stopped sending
//! heartbeats, posts a "left" notice for each and removes them. Every stale
//! participant is handled on its own: a failure for one never aborts the
//! rest of the sweep, and a participant whose notice could not be stored
//! stays registered so the next sweep retries it.

use crate::config::PresenceConfig;
use crate::error::Result;
use crate::messages::MessageStore;
use crate::models::{NewMessage, Participant, LEAVE_NOTICE};
use crate::registry::ParticipantRegistry;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// What happened to one stale participant during a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvictionOutcome {
    /// Notice posted and participant removed.
    Evicted { name: String },
    /// A heartbeat arrived after the scan; the participant stays.
    Revived { name: String },
    /// Someone else removed the participant first.
    Vanished { name: String },
    /// Storage failed; the participant is retried on the next sweep.
    Failed { name: String, error: String },
}

impl EvictionOutcome {
    pub fn name(&self) -> &str {
        match self {
            EvictionOutcome::Evicted { name }
            | EvictionOutcome::Revived { name }
            | EvictionOutcome::Vanished { name }
            | EvictionOutcome::Failed { name, .. } => name,
        }
    }
}

/// Per-participant outcomes of a single sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub outcomes: Vec<EvictionOutcome>,
}

impl SweepReport {
    pub fn evicted(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|o| match o {
            EvictionOutcome::Evicted { name } => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &EvictionOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EvictionOutcome::Failed { .. }))
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn log(&self) {
        for outcome in &self.outcomes {
            match outcome {
                EvictionOutcome::Evicted { name } => info!("[Sweeper] Evicted {}", name),
                EvictionOutcome::Revived { name } => {
                    debug!("[Sweeper] {} revived before removal", name)
                }
                EvictionOutcome::Vanished { name } => debug!("[Sweeper] {} already gone", name),
                EvictionOutcome::Failed { name, error } => {
                    warn!("[Sweeper] Failed to evict {}: {}", name, error)
                }
            }
        }
    }
}

pub struct EvictionSweeper {
    registry: ParticipantRegistry,
    messages: MessageStore,
    config: PresenceConfig,
}

impl EvictionSweeper {
    pub fn new(registry: ParticipantRegistry, messages: MessageStore, config: PresenceConfig) -> Self {
        Self {
            registry,
            messages,
            config,
        }
    }

    /// Run a single sweep over every currently stale participant.
    pub async fn sweep_once(&self) -> Result<SweepReport> {
        self.sweep_until(|| false).await
    }

    /// Sweep, checking `stop` before each participant.
    async fn sweep_until(&self, stop: impl Fn() -> bool) -> Result<SweepReport> {
        let stale = self
            .registry
            .stale_since(self.config.inactivity_threshold)
            .await?;

        let mut report = SweepReport::default();
        for participant in stale {
            if stop() {
                debug!("[Sweeper] Stop requested, leaving remaining participants");
                break;
            }
            report.outcomes.push(self.evict(participant).await);
        }
        Ok(report)
    }

    /// Evict one participant observed as stale by a previous scan.
    ///
    /// The participant is re-read first and the final removal is keyed on
    /// the `last_seen` observed by the scan, so a heartbeat landing at any
    /// point after the scan keeps it registered.
    pub async fn evict(&self, observed: Participant) -> EvictionOutcome {
        let name = observed.name.clone();

        match self.registry.get(&name).await {
            Ok(Some(current)) if current.last_seen != observed.last_seen => {
                return EvictionOutcome::Revived { name };
            }
            Ok(Some(_)) => {}
            Ok(None) => return EvictionOutcome::Vanished { name },
            Err(e) => {
                return EvictionOutcome::Failed {
                    name,
                    error: e.to_string(),
                }
            }
        }

        if let Err(e) = self
            .messages
            .append(NewMessage::status(name.as_str(), LEAVE_NOTICE))
            .await
        {
            return EvictionOutcome::Failed {
                name,
                error: e.to_string(),
            };
        }

        match self
            .registry
            .remove_if_unchanged(&name, observed.last_seen)
            .await
        {
            Ok(true) => EvictionOutcome::Evicted { name },
            Ok(false) => EvictionOutcome::Revived { name },
            Err(e) => EvictionOutcome::Failed {
                name,
                error: e.to_string(),
            },
        }
    }

    /// Sweep every `sweep_interval` until `shutdown` turns true (or its
    /// sender is dropped). An in-flight eviction always completes.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "[Sweeper] Started (interval {:?}, threshold {:?})",
            self.config.sweep_interval, self.config.inactivity_threshold
        );

        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        while !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let stop = shutdown.clone();
            match self.sweep_until(|| *stop.borrow()).await {
                Ok(report) => report.log(),
                Err(e) => warn!("[Sweeper] Scan failed: {}", e),
            }
        }

        info!("[Sweeper] Stopped");
    }

    /// Spawn [`run`](Self::run) on the tokio runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
