//! Centralized configuration for procwatch.
//!
//! Constants for polling, event formatting and the network surface, plus the
//! validated runtime options a [`SubscriptionManager`](crate::SubscriptionManager)
//! is built from.

use crate::error::{ProcwatchError, Result};
use std::time::Duration;

/// Polling and diffing configuration.
pub struct WatchConfig;

impl WatchConfig {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Locale-style timestamp carried in every event (`17/10/2026, 12:18:00`).
    pub const EVENT_DATE_FORMAT: &'static str = "%d/%m/%Y, %H:%M:%S";
}

/// Network-facing configuration.
pub struct ServerConfig;

impl ServerConfig {
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8000;
    pub const DEFAULT_ALLOWED_ORIGIN: &'static str = "http://localhost:3000";
    pub const ANY_ORIGIN: &'static str = "*";
    pub const WS_PATH: &'static str = "/ws";
    pub const HEALTH_PATH: &'static str = "/health";
    /// Frames queued per connection before a client that stopped reading is dropped.
    pub const SEND_QUEUE_CAPACITY: usize = 8192;
}

/// Event names on the wire.
pub struct EventNames;

impl EventNames {
    pub const PROCESSES_STARTED: &'static str = "processesStarted";
    pub const PROCESSES_ENDED: &'static str = "processesEnded";
}

/// Runtime options for polling sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Time between two ticks of a session.
    pub interval: Duration,
    /// Upper bound on a single process-table enumeration.
    pub fetch_timeout: Duration,
}

impl WatchOptions {
    /// Build options from millisecond values, rejecting unusable intervals.
    pub fn from_millis(interval_ms: u64, fetch_timeout_ms: u64) -> Result<Self> {
        let options = Self {
            interval: Duration::from_millis(interval_ms),
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval < WatchConfig::MIN_POLL_INTERVAL {
            return Err(ProcwatchError::Config {
                message: format!(
                    "poll interval {:?} is below the minimum of {:?}",
                    self.interval,
                    WatchConfig::MIN_POLL_INTERVAL
                ),
            });
        }
        if self.fetch_timeout.is_zero() {
            return Err(ProcwatchError::Config {
                message: "fetch timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: WatchConfig::DEFAULT_POLL_INTERVAL,
            fetch_timeout: WatchConfig::DEFAULT_FETCH_TIMEOUT,
        }
    }
}
