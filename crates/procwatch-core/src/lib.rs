//! procwatch core - process table polling and change streams.
//!
//! This crate watches the OS process table and turns consecutive snapshots into
//! "started" / "ended" events for each connected client. It has no network
//! layer of its own; a transport plugs in by implementing
//! [`NotificationChannel`] and calling [`SubscriptionManager::on_connect`] /
//! [`SubscriptionManager::on_disconnect`].
//!
//! # Example
//!
//! ```rust
//! use procwatch_core::diff::compare;
//! use procwatch_core::{ProcessRecord, Snapshot};
//!
//! let before = Snapshot::from(vec![ProcessRecord::new("a", 1)]);
//! let after = Snapshot::from(vec![ProcessRecord::new("a", 99), ProcessRecord::new("b", 2)]);
//!
//! let diff = compare(&before, &after);
//! assert_eq!(diff.started, vec![ProcessRecord::new("b", 2)]);
//! assert!(diff.ended.is_empty());
//! ```

pub mod cancel;
pub mod config;
pub mod diff;
pub mod error;
pub mod process;
pub mod scheduler;
pub mod session;

#[cfg(test)]
mod testing;

pub use cancel::CancellationToken;
pub use config::{EventNames, ServerConfig, WatchConfig, WatchOptions};
pub use diff::DiffResult;
pub use error::{ProcwatchError, Result};
pub use process::{ProcessRecord, Snapshot, SnapshotSource, SysinfoSource};
pub use scheduler::{Scheduler, SchedulerHandle, Tick};
pub use session::{
    NotificationChannel, ProcessEvent, Session, SessionHandle, SessionId, SessionState,
    SubscriptionManager,
};
