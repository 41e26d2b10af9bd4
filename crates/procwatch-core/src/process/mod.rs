//! Process table snapshots.
//!
//! A [`Snapshot`] is an immutable list of [`ProcessRecord`]s taken at one
//! instant. Snapshots come from a [`SnapshotSource`]; in production that is
//! [`SysinfoSource`], which reads the OS process table.
//!
//! # Example
//!
//! ```rust,no_run
//! use procwatch_core::process::{SnapshotSource, SysinfoSource};
//!
//! #[tokio::main]
//! async fn main() -> procwatch_core::Result<()> {
//!     let source = SysinfoSource::new();
//!     let snapshot = source.snapshot().await?;
//!     for record in &snapshot {
//!         println!("{} ({})", record.name, record.pid);
//!     }
//!     Ok(())
//! }
//! ```

mod record;
mod source;

pub use record::{ProcessRecord, Snapshot};
pub use source::{fetch_with_timeout, SnapshotSource, SysinfoSource};
