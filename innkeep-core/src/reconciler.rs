use crate::repository::BookingStore;
use crate::ReconcileError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Cancels pending bookings whose hold window has passed.
///
/// One call is one set-based mutation in the store. There is no retry here;
/// a failed call is simply attempted again on the next scheduled tick.
#[derive(Clone)]
pub struct ExpiryReconciler {
    store: Arc<dyn BookingStore>,
}

impl ExpiryReconciler {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Reconcile against the current wall-clock time
    pub async fn reconcile(&self) -> Result<u64, ReconcileError> {
        self.reconcile_at(Utc::now()).await
    }

    pub async fn reconcile_at(&self, now: DateTime<Utc>) -> Result<u64, ReconcileError> {
        let cancelled = self.store.cancel_expired_bookings(now).await?;
        debug!("Expiry reconciliation as of {} cancelled {} bookings", now, cancelled);
        Ok(cancelled)
    }
}
