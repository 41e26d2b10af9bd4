//! Process table enumeration.

use super::record::{ProcessRecord, Snapshot};
use crate::error::{ProcwatchError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

/// Something that can report the processes currently running.
///
/// Sessions share one source. Every call returns a snapshot taken no earlier
/// than the most recent enumeration still in flight.
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    /// Capture the current process table.
    async fn snapshot(&self) -> Result<Snapshot>;
}

/// Capture a snapshot, failing with [`ProcwatchError::SnapshotTimeout`] if the
/// source takes longer than `timeout`.
pub async fn fetch_with_timeout(source: &dyn SnapshotSource, timeout: Duration) -> Result<Snapshot> {
    match tokio::time::timeout(timeout, source.snapshot()).await {
        Ok(result) => result,
        Err(_) => Err(ProcwatchError::SnapshotTimeout(timeout)),
    }
}

type SharedEnumeration = Shared<BoxFuture<'static, std::result::Result<Snapshot, String>>>;

/// An enumeration running on the blocking pool, awaited by every caller that
/// arrived while it was running.
struct Enumeration {
    finished: Arc<AtomicBool>,
    result: SharedEnumeration,
}

/// Snapshot source backed by the OS process table via `sysinfo`.
///
/// Enumeration is blocking, so it runs on tokio's blocking pool. At most one
/// enumeration runs at a time: callers that arrive while one is in flight wait
/// for its result instead of queueing another behind the table lock, so a
/// hung enumeration costs one blocking thread no matter how many ticks time
/// out on it. The `System` is reused between refreshes and dead processes
/// are dropped on each refresh.
#[derive(Clone)]
pub struct SysinfoSource {
    system: Arc<Mutex<System>>,
    in_flight: Arc<Mutex<Option<Enumeration>>>,
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Join the running enumeration, or start one if none is running.
    fn join_or_start(&self) -> Result<SharedEnumeration> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| ProcwatchError::snapshot("enumeration state lock poisoned"))?;

        if let Some(running) = in_flight.as_ref() {
            if !running.finished.load(Ordering::Acquire) {
                debug!("Joining process enumeration already in flight");
                return Ok(running.result.clone());
            }
        }

        let finished = Arc::new(AtomicBool::new(false));
        let done = finished.clone();
        let system = self.system.clone();
        let task = tokio::task::spawn_blocking(move || {
            let result = Self::enumerate(&system);
            done.store(true, Ordering::Release);
            result
        });

        let result = async move {
            match task.await {
                Ok(Ok(snapshot)) => Ok(snapshot),
                Ok(Err(ProcwatchError::SnapshotFetch { message })) => Err(message),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(format!("Enumeration task failed: {}", e)),
            }
        }
        .boxed()
        .shared();

        *in_flight = Some(Enumeration {
            finished,
            result: result.clone(),
        });
        Ok(result)
    }

    fn enumerate(system: &Mutex<System>) -> Result<Snapshot> {
        let mut system = system
            .lock()
            .map_err(|_| ProcwatchError::snapshot("process table lock poisoned"))?;

        system.refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::new());

        let snapshot: Snapshot = system
            .processes()
            .iter()
            .map(|(pid, process)| {
                ProcessRecord::new(process.name().to_string_lossy().into_owned(), pid.as_u32())
            })
            .collect();

        debug!("Enumerated {} processes", snapshot.len());
        Ok(snapshot)
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SnapshotSource for SysinfoSource {
    async fn snapshot(&self) -> Result<Snapshot> {
        let enumeration = self.join_or_start()?;
        enumeration.await.map_err(ProcwatchError::snapshot)
    }
}
