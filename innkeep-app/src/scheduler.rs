//! Periodic driver for the booking expiry sweep.
//!
//! One worker task calls [`ExpiryReconciler::reconcile`] immediately on
//! start and then at a fixed rate. Ticks never overlap: the next tick is
//! awaited only once the current sweep has returned. If a sweep overruns,
//! the missed ticks fire back-to-back until the schedule has caught up.
//!
//! Stopping is cooperative. The worker sees the stop signal between ticks;
//! an in-flight sweep is given up to the shutdown timeout before the task
//! is aborted.

use crate::error::SchedulerError;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use innkeep_core::ExpiryReconciler;
use innkeep_store::app_config::SchedulerSettings;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Created,
    Running,
    StopRequested,
    Stopped,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Created => "Created",
            SchedulerState::Running => "Running",
            SchedulerState::StopRequested => "StopRequested",
            SchedulerState::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period between tick starts
    pub interval: Duration,
    /// How long `shutdown()` waits for an in-flight sweep
    pub shutdown_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&SchedulerSettings> for SchedulerConfig {
    fn from(settings: &SchedulerSettings) -> Self {
        Self {
            interval: settings.interval(),
            shutdown_timeout: settings.shutdown_timeout(),
        }
    }
}

/// How a call to [`ExpiryScheduler::stop`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// There was no worker to stop
    NotRunning,
    /// The worker finished its current sweep and exited
    Graceful,
    /// The timeout elapsed first and the worker was aborted
    Forced,
    /// The worker had already died before it could be stopped
    Crashed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerMetrics {
    pub ticks: u64,
    pub failures: u64,
    pub bookings_cancelled: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Counters {
    ticks: AtomicU64,
    failures: AtomicU64,
    bookings_cancelled: AtomicU64,
    last_tick_at: Mutex<Option<DateTime<Utc>>>,
}

impl Counters {
    fn record_tick(&self, at: DateTime<Utc>) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_tick_at.lock() {
            *last = Some(at);
        }
    }

    fn snapshot(&self) -> SchedulerMetrics {
        SchedulerMetrics {
            ticks: self.ticks.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            bookings_cancelled: self.bookings_cancelled.load(Ordering::Relaxed),
            last_tick_at: self.last_tick_at.lock().ok().and_then(|last| *last),
        }
    }
}

struct Worker {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct ExpiryScheduler {
    reconciler: ExpiryReconciler,
    config: SchedulerConfig,
    state: SchedulerState,
    counters: Arc<Counters>,
    worker: Option<Worker>,
}

impl ExpiryScheduler {
    pub fn new(reconciler: ExpiryReconciler, config: SchedulerConfig) -> Self {
        Self {
            reconciler,
            config,
            state: SchedulerState::Created,
            counters: Arc::new(Counters::default()),
            worker: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn metrics(&self) -> SchedulerMetrics {
        self.counters.snapshot()
    }

    /// Spawn the worker. Valid only once, from `Created`.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.state != SchedulerState::Created {
            return Err(SchedulerError::InvalidTransition {
                from: self.state,
                op: "start",
            });
        }
        if self.config.interval.is_zero() {
            return Err(SchedulerError::InvalidInterval);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = runtime.spawn(run_worker(
            self.reconciler.clone(),
            self.config.interval,
            stop_rx,
            self.counters.clone(),
        ));

        self.worker = Some(Worker { stop_tx, handle });
        self.state = SchedulerState::Running;
        info!("Expiry scheduler started, sweeping every {:?}", self.config.interval);
        Ok(())
    }

    /// Signal the worker and wait up to `timeout` for it to finish.
    ///
    /// A no-op when the scheduler was never started or is already stopped.
    /// The worker stays owned by the scheduler until the wait is over, so
    /// dropping this future part-way leaves it to be stopped or aborted later.
    pub async fn stop(&mut self, timeout: Duration) -> StopOutcome {
        let Some(worker) = self.worker.as_mut() else {
            debug!("Expiry scheduler stop ignored in state {}", self.state);
            return StopOutcome::NotRunning;
        };

        self.state = SchedulerState::StopRequested;
        if worker.stop_tx.send(true).is_err() {
            debug!("Expiry scheduler worker already exited");
        }

        let outcome = match time::timeout(timeout, &mut worker.handle).await {
            Ok(joined) => join_outcome(joined),
            Err(_) => {
                worker.handle.abort();
                warn!(
                    "Expiry sweep still running after {:?}, worker aborted",
                    timeout
                );
                StopOutcome::Forced
            }
        };

        self.worker = None;
        self.state = SchedulerState::Stopped;
        info!("Expiry scheduler stopped ({:?})", outcome);
        outcome
    }

    /// Stop using the configured shutdown timeout
    pub async fn shutdown(&mut self) -> StopOutcome {
        let timeout = self.config.shutdown_timeout;
        self.stop(timeout).await
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.handle.abort();
        }
    }
}

async fn run_worker(
    reconciler: ExpiryReconciler,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
    counters: Arc<Counters>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            biased;
            // Sender dropped counts as a stop request too
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        tick += 1;
        let started = Instant::now();
        counters.record_tick(Utc::now());

        let result = AssertUnwindSafe(reconciler.reconcile()).catch_unwind().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(cancelled)) if cancelled > 0 => {
                counters.bookings_cancelled.fetch_add(cancelled, Ordering::Relaxed);
                info!(tick, cancelled, elapsed_ms, "Cancelled {} expired pending bookings", cancelled);
            }
            Ok(Ok(_)) => {
                debug!(tick, elapsed_ms, "No expired pending bookings");
            }
            Ok(Err(e)) => {
                counters.failures.fetch_add(1, Ordering::Relaxed);
                error!(tick, elapsed_ms, "Error in booking expiry sweep: {}", e);
            }
            Err(panic) => {
                counters.failures.fetch_add(1, Ordering::Relaxed);
                error!(tick, elapsed_ms, "Booking expiry sweep panicked: {}", panic_message(&*panic));
            }
        }

        if started.elapsed() > interval {
            warn!(tick, elapsed_ms, "Booking expiry sweep overran its {:?} interval", interval);
        }
    }

    debug!("Expiry scheduler worker exiting after {} ticks", tick);
}

fn join_outcome(joined: Result<(), JoinError>) -> StopOutcome {
    match joined {
        Ok(()) => StopOutcome::Graceful,
        Err(e) => {
            error!("Expiry scheduler worker terminated abnormally: {}", e);
            StopOutcome::Crashed
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
