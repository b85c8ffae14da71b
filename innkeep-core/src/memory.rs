use crate::booking::{Booking, BookingStatus};
use crate::repository::BookingStore;
use crate::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Booking store kept in process memory.
///
/// The expiry sweep runs under a single lock acquisition, so it is atomic
/// with respect to every other call on the same store.
#[derive(Default)]
pub struct MemoryBookingStore {
    bookings: Mutex<HashMap<Uuid, Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, booking: Booking) {
        self.lock().insert(booking.id, booking);
    }

    pub fn get(&self, id: &Uuid) -> Option<Booking> {
        self.lock().get(id).cloned()
    }

    /// Move a booking from `from` to `to`, as the interactive side would.
    ///
    /// Returns false when the booking is missing or no longer in `from`.
    pub fn transition(&self, id: &Uuid, from: BookingStatus, to: BookingStatus) -> bool {
        match self.lock().get_mut(id) {
            Some(booking) if booking.status == from => {
                booking.status = to;
                booking.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn count_with_status(&self, status: BookingStatus) -> usize {
        self.lock().values().filter(|b| b.status == status).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Booking>> {
        // A panic while holding the lock cannot leave a booking half-written
        self.bookings.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn cancel_expired_bookings(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut bookings = self.lock();
        let mut cancelled = 0;

        for booking in bookings.values_mut().filter(|b| b.is_expired_at(now)) {
            booking.status = BookingStatus::ExpiredCancelled;
            booking.updated_at = now;
            cancelled += 1;
        }

        Ok(cancelled)
    }
}
