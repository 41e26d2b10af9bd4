//! Fixed-rate tick scheduling.
//!
//! A [`Scheduler`] owns one [`Tick`] implementation and drives it from a single
//! tokio task. Each tick is awaited to completion before the next one may fire,
//! so ticks never overlap. Deadlines missed while a tick was running are
//! skipped rather than queued, and the next tick comes one interval after the
//! slow one finished.

use crate::cancel::CancellationToken;
use crate::error::{ProcwatchError, Result};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Work performed on every scheduler tick.
#[async_trait::async_trait]
pub trait Tick: Send + 'static {
    async fn tick(&mut self);
}

/// Starts tick loops.
pub struct Scheduler;

impl Scheduler {
    /// Start ticking `tick` every `interval`.
    ///
    /// The first tick fires one full interval after start. Must be called from
    /// within a tokio runtime.
    pub fn start<T: Tick>(interval: Duration, tick: T) -> Result<SchedulerHandle> {
        if interval.is_zero() {
            return Err(ProcwatchError::Config {
                message: "scheduler interval must be greater than zero".to_string(),
            });
        }

        let token = CancellationToken::new();
        let task = tokio::spawn(Self::run(interval, tick, token.clone()));

        Ok(SchedulerHandle {
            token,
            task: Some(task),
        })
    }

    async fn run<T: Tick>(period: Duration, mut tick: T, token: CancellationToken) {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Prefer cancellation when both are ready.
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
            }

            let started = Instant::now();
            tick.tick().await;

            let elapsed = started.elapsed();
            if elapsed >= period {
                debug!(
                    "Tick took {:?} (interval {:?}); skipping {} missed tick(s)",
                    elapsed,
                    period,
                    elapsed.as_nanos() / period.as_nanos()
                );
                // Deadlines that passed during the tick are dropped; the next
                // tick is a full interval away.
                interval.reset();
            }

            if token.is_cancelled() {
                break;
            }
        }

        debug!("Scheduler stopped");
    }
}

/// Handle to a running scheduler.
///
/// Dropping the handle cancels the scheduler.
pub struct SchedulerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop scheduling new ticks. A tick already running finishes normally.
    ///
    /// Calling this more than once has no further effect.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the scheduler task to exit (after [`cancel`](Self::cancel)).
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
