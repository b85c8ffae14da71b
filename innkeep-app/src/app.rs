use crate::error::{AppError, SchedulerError};
use crate::scheduler::{ExpiryScheduler, SchedulerConfig, StopOutcome};
use innkeep_core::{BookingStore, ExpiryReconciler, MemoryBookingStore};
use innkeep_store::app_config::Config;
use innkeep_store::{DbClient, PgBookingStore};
use std::fmt::Display;
use std::future::{self, Future};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Composition root: owns the shared database handle and the expiry scheduler.
///
/// The handle is released only after the scheduler has fully stopped, so the
/// worker never sees the pool closed underneath it.
pub struct App {
    scheduler: ExpiryScheduler,
    db: Option<DbClient>,
}

impl App {
    pub fn new(config: SchedulerConfig, store: Arc<dyn BookingStore>, db: Option<DbClient>) -> Self {
        let reconciler = ExpiryReconciler::new(store);
        Self {
            scheduler: ExpiryScheduler::new(reconciler, config),
            db,
        }
    }

    /// Build from configuration, connecting and migrating Postgres unless the
    /// in-memory backend is selected.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let scheduler_config = SchedulerConfig::from(&config.scheduler);

        if config.database.is_memory() {
            warn!("Using in-memory booking store, nothing will be persisted");
            return Ok(Self::new(scheduler_config, Arc::new(MemoryBookingStore::new()), None));
        }

        let db = DbClient::new(&config.database.url, config.database.max_connections)
            .await
            .map_err(|e| AppError::Connect(e.to_string()))?;
        if let Err(e) = db.migrate().await {
            db.close().await;
            return Err(AppError::Migrate(e.to_string()));
        }
        info!("Connected to booking database");

        let store = Arc::new(PgBookingStore::new(db.pool.clone()));
        Ok(Self::new(scheduler_config, store, Some(db)))
    }

    pub fn scheduler(&self) -> &ExpiryScheduler {
        &self.scheduler
    }

    pub fn start(&mut self) -> Result<(), SchedulerError> {
        self.scheduler.start()
    }

    /// Stop the scheduler, then release the database handle. Safe to call twice.
    pub async fn shutdown(&mut self) -> StopOutcome {
        let outcome = self.scheduler.shutdown().await;
        if outcome == StopOutcome::Forced {
            warn!("Expiry sweep abandoned at shutdown");
        }
        if let Some(db) = self.db.take() {
            db.close().await;
        }
        outcome
    }

    /// Start, wait for `signal`, then shut down.
    ///
    /// The database handle is released even when the scheduler refuses to start.
    pub async fn run_until<F>(&mut self, signal: F) -> Result<StopOutcome, AppError>
    where
        F: Future<Output = ()>,
    {
        if let Err(e) = self.start() {
            self.shutdown().await;
            return Err(e.into());
        }
        signal.await;
        info!("Shutdown requested");
        Ok(self.shutdown().await)
    }
}

/// Resolve when `signal` fires. A signal that cannot be listened for never
/// resolves, so the service keeps running until it is stopped another way.
pub async fn wait_for_signal<F, E>(signal: F)
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    if let Err(e) = signal.await {
        error!("Failed to listen for shutdown signal: {}", e);
        future::pending::<()>().await;
    }
}
