//! Per-client polling sessions.
//!
//! Every connected client gets its own [`Session`]: a baseline snapshot, a
//! scheduler, and the channel its events go to. Sessions never share state, so
//! a slow or broken client cannot affect the others.
//!
//! # Example
//!
//! ```rust,no_run
//! use procwatch_core::{SubscriptionManager, SysinfoSource, WatchOptions};
//! # use procwatch_core::{NotificationChannel, ProcessEvent};
//! # use std::sync::Arc;
//! # struct Printer;
//! # impl NotificationChannel for Printer {
//! #     fn emit(&self, event: &str, payload: &ProcessEvent) -> procwatch_core::Result<()> {
//! #         println!("{event}: {} ({})", payload.name, payload.pid);
//! #         Ok(())
//! #     }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> procwatch_core::Result<()> {
//!     let manager = SubscriptionManager::new(Arc::new(SysinfoSource::new()), WatchOptions::default())?;
//!     let session = manager.on_connect(Arc::new(Printer)).await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!     manager.on_disconnect(&session).await;
//!     Ok(())
//! }
//! ```

use crate::config::{EventNames, WatchConfig, WatchOptions};
use crate::diff::{self, DiffResult};
use crate::error::{ProcwatchError, Result};
use crate::process::{fetch_with_timeout, ProcessRecord, Snapshot, SnapshotSource};
use crate::scheduler::{Scheduler, SchedulerHandle, Tick};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Payload of `processesStarted` and `processesEnded` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEvent {
    pub name: String,
    pub pid: u32,
    /// Local time the diff was computed, e.g. `17/10/2026, 12:18:00`.
    pub date: String,
}

impl ProcessEvent {
    fn from_record(record: &ProcessRecord, date: &str) -> Self {
        Self {
            name: record.name.clone(),
            pid: record.pid,
            date: date.to_string(),
        }
    }
}

/// Push side of a client connection.
///
/// Implementations must not block. Once the client is gone, `emit` returns
/// [`ProcwatchError::ChannelClosed`].
pub trait NotificationChannel: Send + Sync + 'static {
    fn emit(&self, event: &str, payload: &ProcessEvent) -> Result<()>;
}

/// Identifies a session in logs and in the manager's session table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable state of one session. Only the session's own tick touches it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    baseline: Snapshot,
}

impl SessionState {
    pub fn baseline(&self) -> &Snapshot {
        &self.baseline
    }
}

/// One client's fetch-compare-emit loop.
pub struct Session {
    id: SessionId,
    state: SessionState,
    source: Arc<dyn SnapshotSource>,
    channel: Arc<dyn NotificationChannel>,
    fetch_timeout: Duration,
}

impl Session {
    /// Create a session with an empty baseline, so its first poll reports every
    /// running process as started.
    pub fn new(
        id: SessionId,
        source: Arc<dyn SnapshotSource>,
        channel: Arc<dyn NotificationChannel>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            id,
            state: SessionState::default(),
            source,
            channel,
            fetch_timeout,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run one fetch-compare-emit cycle.
    ///
    /// On a fetch failure the baseline is left as it was and the error is
    /// returned; nothing is emitted. Otherwise the new snapshot becomes the
    /// baseline whatever happens to delivery.
    pub async fn poll(&mut self) -> Result<DiffResult> {
        let snapshot = fetch_with_timeout(self.source.as_ref(), self.fetch_timeout).await?;
        let diff = diff::compare(&self.state.baseline, &snapshot);

        self.deliver(&diff);
        self.state.baseline = snapshot;

        Ok(diff)
    }

    fn deliver(&self, diff: &DiffResult) {
        if diff.is_empty() {
            return;
        }

        let date = diff
            .observed_at
            .format(WatchConfig::EVENT_DATE_FORMAT)
            .to_string();

        let events = diff
            .started
            .iter()
            .map(|r| (EventNames::PROCESSES_STARTED, r))
            .chain(diff.ended.iter().map(|r| (EventNames::PROCESSES_ENDED, r)));

        for (event, record) in events {
            match self.channel.emit(event, &ProcessEvent::from_record(record, &date)) {
                Ok(()) => {}
                Err(ProcwatchError::ChannelClosed) => {
                    debug!("Session {}: channel closed, dropping remaining events", self.id);
                    return;
                }
                Err(e) => {
                    warn!("Session {}: failed to emit {} for {}: {}", self.id, event, record.name, e);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Tick for Session {
    async fn tick(&mut self) {
        match self.poll().await {
            Ok(diff) => {
                if !diff.is_empty() {
                    debug!(
                        "Session {}: {} started, {} ended",
                        self.id,
                        diff.started.len(),
                        diff.ended.len()
                    );
                }
            }
            Err(e) => {
                warn!("Session {}: failed to get process list: {}", self.id, e);
            }
        }
    }
}

/// Handle returned to the transport for a connected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHandle {
    id: SessionId,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

/// Binds client channels to independent polling sessions.
pub struct SubscriptionManager {
    source: Arc<dyn SnapshotSource>,
    options: WatchOptions,
    sessions: Mutex<HashMap<SessionId, SchedulerHandle>>,
}

impl SubscriptionManager {
    pub fn new(source: Arc<dyn SnapshotSource>, options: WatchOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            source,
            options,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn options(&self) -> WatchOptions {
        self.options
    }

    /// Start a session for a newly connected client.
    pub async fn on_connect(&self, channel: Arc<dyn NotificationChannel>) -> Result<SessionHandle> {
        let id = SessionId::new();
        let session = Session::new(id, self.source.clone(), channel, self.options.fetch_timeout);
        let scheduler = Scheduler::start(self.options.interval, session)?;

        let mut sessions = self.sessions.lock().await;
        sessions.insert(id, scheduler);
        info!("Session {} connected ({} active)", id, sessions.len());

        Ok(SessionHandle { id })
    }

    /// Stop a client's session. Unknown or already removed sessions are ignored.
    pub async fn on_disconnect(&self, handle: &SessionHandle) {
        let mut sessions = self.sessions.lock().await;
        match sessions.remove(&handle.id) {
            Some(scheduler) => {
                scheduler.cancel();
                info!("Session {} disconnected ({} active)", handle.id, sessions.len());
            }
            None => debug!("Session {} already disconnected", handle.id),
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Cancel every session, e.g. on server shutdown.
    pub async fn shutdown(&self) {
        let mut sessions = self.sessions.lock().await;
        for (_, scheduler) in sessions.drain() {
            scheduler.cancel();
        }
    }
}
