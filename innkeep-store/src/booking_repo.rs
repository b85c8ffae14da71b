use async_trait::async_trait;
use chrono::{DateTime, Utc};
use innkeep_core::{BookingStatus, BookingStore, StoreError, StoreResult};
use sqlx::PgPool;

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn cancel_expired_bookings(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        // Single statement: the status predicate is re-checked under the row
        // lock, so a booking confirmed concurrently is left alone.
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $1, updated_at = $2
            WHERE status = $3 AND hold_expires_at < $2
            "#,
        )
        .bind(BookingStatus::ExpiredCancelled.as_str())
        .bind(now)
        .bind(BookingStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected())
    }
}

/// Connection-level failures are reported as an unavailable store
pub fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Database(other.to_string()),
    }
}
