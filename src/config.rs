//! Runtime configuration for the workflow engine.
//!
//! Values are layered from an optional `signoff.toml` file and `SIGNOFF_*`
//! environment variables, e.g. `SIGNOFF_LOCK_TIMEOUT_MS=500`.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File read by [`WorkflowConfig::load`] when present.
pub const DEFAULT_CONFIG_FILE: &str = "signoff.toml";

/// Prefix of environment variables overriding file values.
pub const ENV_PREFIX: &str = "SIGNOFF";

/// Largest event channel the coordinator will allocate.
pub const MAX_EVENT_BUFFER: usize = 65_536;

/// Tunables for transition coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Longest wait for a task's lock before a transition fails as busy.
    pub lock_timeout_ms: u64,
    /// Read-decide-write retries after another writer moved the task first.
    pub max_conflict_retries: u32,
    /// Requested capacity of the transition event channel. See
    /// [`WorkflowConfig::event_capacity`] for the value actually used.
    pub event_buffer: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 2_000,
            max_conflict_retries: 3,
            event_buffer: 256,
        }
    }
}

impl WorkflowConfig {
    /// Loads configuration from `signoff.toml` and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source is unreadable or a value has the
    /// wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads configuration from `path` (if it exists) and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source is unreadable or a value has the
    /// wrong type.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Sets the lock wait.
    #[must_use]
    pub const fn with_lock_timeout_ms(mut self, lock_timeout_ms: u64) -> Self {
        self.lock_timeout_ms = lock_timeout_ms;
        self
    }

    /// Sets the conflict retry budget.
    #[must_use]
    pub const fn with_max_conflict_retries(mut self, max_conflict_retries: u32) -> Self {
        self.max_conflict_retries = max_conflict_retries;
        self
    }

    /// Sets the event channel capacity.
    #[must_use]
    pub const fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer;
        self
    }

    /// Returns the event channel capacity, clamped to
    /// `1..=`[`MAX_EVENT_BUFFER`].
    #[must_use]
    pub fn event_capacity(&self) -> usize {
        self.event_buffer.clamp(1, MAX_EVENT_BUFFER)
    }

    /// Returns the lock wait as a [`Duration`].
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
