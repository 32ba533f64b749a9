//! Actor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do when `knows` encounters a name that is already registered
/// bound to a *different* callable. Re-ingesting the identical callable is
/// always a silent no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Replace the existing entry in place, keeping its registry position.
    #[default]
    Overwrite,
    /// Reject with `RegistryError::DuplicateCapability`.
    Strict,
}

/// Configuration carried by every actor and inherited by derived actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Duplicate-registration policy for all ingestion paths.
    pub duplicate_policy: DuplicatePolicy,
    /// Timeout used by `wait` when none is given explicitly.
    pub wait_timeout: Duration,
    /// Interval used by `wait` when none is given explicitly.
    pub wait_interval: Duration,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            wait_timeout: Duration::from_secs(30),
            wait_interval: Duration::from_secs(1),
        }
    }
}
