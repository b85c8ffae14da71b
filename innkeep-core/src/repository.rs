use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::StoreResult;

/// Data-access primitive the expiry reconciler depends on
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Move every `PENDING` booking whose hold expired strictly before `now`
    /// to `EXPIRED_CANCELLED` in one atomic operation.
    ///
    /// Returns the number of bookings changed. Rows in any other status are
    /// never touched, so a second call with no intervening writes returns 0.
    async fn cancel_expired_bookings(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}
