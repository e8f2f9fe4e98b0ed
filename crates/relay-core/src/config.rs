//! Presence timing configuration

use crate::error::{RelayError, Result};
use std::time::Duration;

/// Default time between eviction sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(15);
/// Default inactivity after which a participant is considered gone.
pub const DEFAULT_INACTIVITY_THRESHOLD: Duration = Duration::from_secs(10);
/// Largest accepted inactivity threshold (one year).
pub const MAX_INACTIVITY_THRESHOLD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Timing knobs for the eviction sweeper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresenceConfig {
    /// How often the sweeper scans the registry
    pub sweep_interval: Duration,
    /// Participants not seen for longer than this are evicted
    pub inactivity_threshold: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            inactivity_threshold: DEFAULT_INACTIVITY_THRESHOLD,
        }
    }
}

impl PresenceConfig {
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_inactivity_threshold(mut self, threshold: Duration) -> Self {
        self.inactivity_threshold = threshold;
        self
    }

    /// Reject timings the sweeper cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval.is_zero() {
            return Err(RelayError::validation("sweep interval must be greater than zero"));
        }
        if self.inactivity_threshold > MAX_INACTIVITY_THRESHOLD {
            return Err(RelayError::validation(format!(
                "inactivity threshold {:?} exceeds {:?}",
                self.inactivity_threshold, MAX_INACTIVITY_THRESHOLD
            )));
        }
        Ok(())
    }
}
