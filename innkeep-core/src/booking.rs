use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;

/// Booking status as persisted in the `bookings.status` column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    /// Cancelled automatically because the hold window ran out
    ExpiredCancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::ExpiredCancelled => "EXPIRED_CANCELLED",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::ExpiredCancelled)
    }

    /// No further transitions are allowed out of a terminal status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "EXPIRED_CANCELLED" => Ok(BookingStatus::ExpiredCancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// The slice of a booking row needed to decide expiry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub hold_expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// A new pending booking held for `hold` from now
    pub fn pending(hold: Duration) -> Self {
        Self::pending_at(Utc::now(), hold)
    }

    pub fn pending_at(created_at: DateTime<Utc>, hold: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: BookingStatus::Pending,
            created_at,
            hold_expires_at: created_at + hold,
            updated_at: created_at,
        }
    }

    /// Pending and past its hold window. The boundary instant itself is not expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Pending && self.hold_expires_at < now
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_hold_expiry(mut self, hold_expires_at: DateTime<Utc>) -> Self {
        self.hold_expires_at = hold_expires_at;
        self
    }
}
