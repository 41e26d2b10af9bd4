//! Test doubles for snapshot sources and notification channels.

use crate::error::{ProcwatchError, Result};
use crate::process::{ProcessRecord, Snapshot, SnapshotSource};
use crate::session::{NotificationChannel, ProcessEvent};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type ScriptStep = std::result::Result<Vec<(&'static str, u32)>, &'static str>;

/// Replays a fixed sequence of snapshots (or failures), then keeps returning
/// the last step.
pub struct ScriptedSource {
    steps: Mutex<VecDeque<ScriptStep>>,
    last: Mutex<Option<ScriptStep>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every snapshot take `delay` before returning.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> ScriptStep {
        let mut steps = self.steps.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(step) = steps.pop_front() {
            *last = Some(step.clone());
            step
        } else {
            last.clone().unwrap_or(Ok(Vec::new()))
        }
    }
}

#[async_trait::async_trait]
impl SnapshotSource for ScriptedSource {
    async fn snapshot(&self) -> Result<Snapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.next_step() {
            Ok(entries) => Ok(entries
                .into_iter()
                .map(|(name, pid)| ProcessRecord::new(name, pid))
                .collect()),
            Err(message) => Err(ProcwatchError::snapshot(message)),
        }
    }
}

/// Records every emitted event. Can be closed to simulate a disconnected client.
#[derive(Default)]
pub struct RecordingChannel {
    events: Mutex<Vec<(String, ProcessEvent)>>,
    closed: AtomicBool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<(String, ProcessEvent)> {
        self.events.lock().unwrap().clone()
    }

    /// Names carried by events of the given kind, in emission order.
    pub fn names(&self, event: &str) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, payload)| payload.name.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl NotificationChannel for RecordingChannel {
    fn emit(&self, event: &str, payload: &ProcessEvent) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ProcwatchError::ChannelClosed);
        }
        self.events
            .lock()
            .unwrap()
            .push((event.to_string(), payload.clone()));
        Ok(())
    }
}
