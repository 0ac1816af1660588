//! Cosmetic progress for a running submission.
//!
//! The service reports nothing until it answers, so the estimator just climbs
//! by a random step every tick and parks at [`CEILING`] until stopped. The
//! value is published on a `watch` channel that front ends render from.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Highest value the estimate reaches on its own
pub const CEILING: f64 = 90.0;
/// Upper bound (exclusive) of a single random increment
pub const MAX_STEP: f64 = 10.0;
/// Default interval between increments
pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uploading,
    Parsing,
    Translating,
    Generating,
}

impl Phase {
    /// Phase shown for an estimated percentage
    pub fn for_percent(percent: f64) -> Self {
        if percent < 30.0 {
            Self::Uploading
        } else if percent < 60.0 {
            Self::Parsing
        } else {
            Self::Translating
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Uploading => "Uploading...",
            Self::Parsing => "Parsing...",
            Self::Translating => "Translating...",
            Self::Generating => "Generating PDF...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub percent: f64,
    pub phase: Phase,
}

impl ProgressSnapshot {
    pub const fn start() -> Self {
        Self {
            percent: 0.0,
            phase: Phase::Uploading,
        }
    }

    pub const fn finished() -> Self {
        Self {
            percent: 100.0,
            phase: Phase::Generating,
        }
    }
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self::start()
    }
}

/// Next estimate after a step. Values at or above the ceiling do not move.
pub fn advance(percent: f64, step: f64) -> f64 {
    if percent >= CEILING {
        percent
    } else {
        (percent + step).min(CEILING)
    }
}

/// Running estimator task. Dropping it stops the task.
pub struct ProgressEstimator {
    tx: Arc<watch::Sender<ProgressSnapshot>>,
    stopped: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressEstimator {
    /// Reset the channel to 0% and start ticking
    pub fn start(tx: Arc<watch::Sender<ProgressSnapshot>>, tick: Duration) -> Self {
        Self::start_with_rng(tx, tick, StdRng::from_os_rng())
    }

    pub fn start_with_rng<R>(
        tx: Arc<watch::Sender<ProgressSnapshot>>,
        tick: Duration,
        mut rng: R,
    ) -> Self
    where
        R: Rng + Send + 'static,
    {
        tx.send_replace(ProgressSnapshot::start());

        let stopped = Arc::new(AtomicBool::new(false));
        let task_tx = Arc::clone(&tx);
        let task_stopped = Arc::clone(&stopped);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);
            loop {
                interval.tick().await;
                let step = rng.random_range(0.0..MAX_STEP);
                // The flag is checked under the channel lock, so once `stop`
                // returns no tick can publish.
                task_tx.send_if_modified(|snapshot| {
                    if task_stopped.load(Ordering::SeqCst) || snapshot.percent >= CEILING {
                        return false;
                    }
                    snapshot.percent = advance(snapshot.percent, step);
                    snapshot.phase = Phase::for_percent(snapshot.percent);
                    true
                });
            }
        });

        debug!("Progress estimator started ({:?} tick)", tick);

        Self {
            tx,
            stopped,
            handle: Some(handle),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> ProgressSnapshot {
        *self.tx.borrow()
    }

    pub const fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Cancel the ticking task. Safe to call more than once.
    pub fn stop(&mut self) {
        let stopped = &self.stopped;
        self.tx.send_if_modified(|_| {
            stopped.store(true, Ordering::SeqCst);
            false
        });

        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Progress estimator stopped");
        }
    }

    /// Stop and publish 100% / generating
    pub fn complete(&mut self) {
        self.stop();
        self.tx.send_replace(ProgressSnapshot::finished());
    }
}

impl Drop for ProgressEstimator {
    fn drop(&mut self) {
        self.stop();
    }
}
