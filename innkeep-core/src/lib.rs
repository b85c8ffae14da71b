pub mod booking;
pub mod repository;
pub mod reconciler;
pub mod memory;

pub use booking::{Booking, BookingStatus};
pub use repository::BookingStore;
pub use reconciler::ExpiryReconciler;
pub use memory::MemoryBookingStore;

/// Errors surfaced by a booking store
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Booking store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Expiry reconciliation failed: {0}")]
    Store(#[from] StoreError),
}

pub type StoreResult<T> = Result<T, StoreError>;
