//! Integration tests for procwatch-core.
//!
//! These exercise the public API the server builds on: diffing, sessions
//! driven by the scheduler, and the real sysinfo-backed source.

use procwatch_core::diff::compare;
use procwatch_core::{
    EventNames, NotificationChannel, ProcessEvent, ProcessRecord, ProcwatchError, Result,
    Snapshot, SnapshotSource, SubscriptionManager, SysinfoSource, WatchOptions,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Collects emitted events.
#[derive(Default)]
struct Collector {
    events: Mutex<Vec<(String, ProcessEvent)>>,
}

impl Collector {
    fn started(&self) -> Vec<ProcessEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(event, _)| event == EventNames::PROCESSES_STARTED)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    fn ended(&self) -> Vec<ProcessEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(event, _)| event == EventNames::PROCESSES_ENDED)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl NotificationChannel for Collector {
    fn emit(&self, event: &str, payload: &ProcessEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push((event.to_string(), payload.clone()));
        Ok(())
    }
}

/// Source whose table can be swapped between ticks, or made to fail.
struct ManualSource {
    table: Mutex<Option<Vec<ProcessRecord>>>,
}

impl ManualSource {
    fn new(entries: &[(&str, u32)]) -> Self {
        let source = Self {
            table: Mutex::new(None),
        };
        source.set(entries);
        source
    }

    fn set(&self, entries: &[(&str, u32)]) {
        let records = entries
            .iter()
            .map(|(name, pid)| ProcessRecord::new(*name, *pid))
            .collect();
        *self.table.lock().unwrap() = Some(records);
    }

    fn fail(&self) {
        *self.table.lock().unwrap() = None;
    }
}

#[async_trait::async_trait]
impl SnapshotSource for ManualSource {
    async fn snapshot(&self) -> Result<Snapshot> {
        match self.table.lock().unwrap().clone() {
            Some(records) => Ok(Snapshot::from(records)),
            None => Err(ProcwatchError::snapshot("process table unavailable")),
        }
    }
}

fn fast_options() -> WatchOptions {
    WatchOptions::from_millis(100, 1000).unwrap()
}

#[test]
fn test_pid_change_on_existing_name() {
    let baseline = Snapshot::from(vec![ProcessRecord::new("a", 1)]);
    let current = Snapshot::from(vec![ProcessRecord::new("a", 99), ProcessRecord::new("b", 2)]);

    let diff = compare(&baseline, &current);
    assert_eq!(diff.started, vec![ProcessRecord::new("b", 2)]);
    assert!(diff.ended.is_empty());
}

#[test]
fn test_everything_ended() {
    let baseline = Snapshot::from(vec![ProcessRecord::new("a", 1), ProcessRecord::new("b", 2)]);

    let diff = compare(&baseline, &Snapshot::empty());
    assert!(diff.started.is_empty());
    assert_eq!(diff.ended, vec![ProcessRecord::new("a", 1), ProcessRecord::new("b", 2)]);
}

#[tokio::test(start_paused = true)]
async fn test_session_follows_table_changes() {
    let source = Arc::new(ManualSource::new(&[("init", 1), ("sshd", 40)]));
    let manager = SubscriptionManager::new(source.clone(), fast_options()).unwrap();
    let collector = Arc::new(Collector::default());

    let session = manager.on_connect(collector.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    let started: Vec<String> = collector.started().into_iter().map(|e| e.name).collect();
    assert_eq!(started, vec!["init", "sshd"]);

    source.set(&[("init", 1), ("nginx", 812)]);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let latest_started = collector.started().pop().unwrap();
    assert_eq!(latest_started.name, "nginx");
    assert_eq!(latest_started.pid, 812);
    let ended = collector.ended();
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].name, "sshd");
    assert_eq!(ended[0].pid, 40);

    manager.on_disconnect(&session).await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_ticks_retry_against_same_baseline() {
    let source = Arc::new(ManualSource::new(&[("a", 1), ("b", 2)]));
    let manager = SubscriptionManager::new(source.clone(), fast_options()).unwrap();
    let collector = Arc::new(Collector::default());

    let session = manager.on_connect(collector.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(collector.started().len(), 2);

    // Several failing ticks: nothing emitted, session keeps running.
    source.fail();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(collector.started().len(), 2);
    assert!(collector.ended().is_empty());
    assert_eq!(manager.active_sessions().await, 1);

    // Recovery diffs against the last good table, not an empty one.
    source.set(&[("b", 2), ("c", 3)]);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let started: Vec<String> = collector.started().into_iter().map(|e| e.name).collect();
    let ended: Vec<String> = collector.ended().into_iter().map(|e| e.name).collect();
    assert_eq!(started, vec!["a", "b", "c"]);
    assert_eq!(ended, vec!["a"]);

    manager.on_disconnect(&session).await;
}

#[tokio::test]
async fn test_first_tick_sees_this_process() {
    let manager = SubscriptionManager::new(Arc::new(SysinfoSource::new()), fast_options()).unwrap();
    let collector = Arc::new(Collector::default());

    let session = manager.on_connect(collector.clone()).await.unwrap();

    let own_pid = std::process::id();
    let mut seen = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if !collector.started().is_empty() {
            // Name matching reports one pid per name, so look for our name.
            let own_name = SysinfoSource::new()
                .snapshot()
                .await
                .unwrap()
                .iter()
                .find(|r| r.pid == own_pid)
                .map(|r| r.name.clone())
                .unwrap();
            seen = collector.started().iter().any(|e| e.name == own_name);
            break;
        }
    }

    manager.on_disconnect(&session).await;
    assert!(seen, "first tick should report the test process as started");
}
