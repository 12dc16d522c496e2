//! Booking domain entity and lifecycle state machine

use chrono::{DateTime, Duration, Utc};

use crate::domain::DomainResult;
use crate::shared::types::errors::DomainError;

/// Booking lifecycle status.
///
/// Main path: `Pending -> Confirmed -> Active -> Completed`.
/// Payment side-channel: `Pending/Confirmed -> Paid -> Refunded`,
/// with `Paid -> Active` resuming the main path.
/// `Completed`, `Cancelled` and `Refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Paid,
    Active,
    Completed,
    Cancelled,
    Refunded,
}

/// Statuses that count toward a lot's occupancy at admission time.
pub const OCCUPYING_STATUSES: [BookingStatus; 3] = [
    BookingStatus::Pending,
    BookingStatus::Confirmed,
    BookingStatus::Active,
];

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Paid => "PAID",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "CONFIRMED" => Some(Self::Confirmed),
            "PAID" => Some(Self::Paid),
            "ACTIVE" => Some(Self::Active),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Refunded)
    }

    /// Whether the booking has been paid (or moved past payment).
    pub fn is_paid_or_later(&self) -> bool {
        matches!(
            self,
            Self::Paid | Self::Active | Self::Completed | Self::Refunded
        )
    }

    /// Legal transitions per the lifecycle table.
    pub fn can_transition_to(&self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Pending, Paid)
                | (Pending, Cancelled)
                | (Confirmed, Paid)
                | (Confirmed, Cancelled)
                | (Paid, Active)
                | (Paid, Refunded)
                | (Active, Completed)
                | (Active, Cancelled)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who is attempting an operation on a booking.
///
/// Identity itself is established upstream; the core only checks that
/// the actor kind is allowed to drive the requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Driver(i32),
    Owner(i32),
    /// Asynchronous payment-gateway callbacks (confirmation, refund ack).
    Gateway,
}

/// A parking space booking.
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: i32,
    pub driver_id: i32,
    pub lot_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Derived from the window at creation/reschedule, minutes.
    pub duration_minutes: i32,
    /// Frozen at creation/reschedule; never recomputed when the lot's
    /// hourly rate changes later.
    pub total_price_cents: i64,
    pub status: BookingStatus,
    pub vehicle_info: Option<String>,
    pub notes: Option<String>,
    pub payment_intent_id: Option<String>,
    pub payment_completed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Longest admissible booking window. Keeps the derived minute count
/// well inside `i32` so duration and price math cannot wrap.
pub const MAX_WINDOW_DAYS: i64 = 365;

/// Reject malformed, past or over-long windows before any capacity
/// check.
pub fn validate_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> DomainResult<()> {
    if end <= start {
        return Err(DomainError::Validation(
            "End time must be after start time".to_string(),
        ));
    }
    if start < now {
        return Err(DomainError::Validation(
            "Start time cannot be in the past".to_string(),
        ));
    }
    if end - start > Duration::days(MAX_WINDOW_DAYS) {
        return Err(DomainError::Validation(format!(
            "Booking window cannot exceed {} days",
            MAX_WINDOW_DAYS
        )));
    }
    Ok(())
}

/// Window length in whole minutes, rounded up.
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i32 {
    let secs = (end - start).num_seconds().max(0);
    (secs as u64).div_ceil(60) as i32
}

/// Price for `minutes` at `price_per_hour_cents`, rounded half-up to a cent.
pub fn total_price_cents(minutes: i32, price_per_hour_cents: i64) -> i64 {
    let numerator = minutes as i64 * price_per_hour_cents;
    (numerator + 30) / 60
}

impl Booking {
    /// Two half-open intervals `[start, end)` overlap iff
    /// `a.start < b.end && a.end > b.start`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }

    /// Check that `actor` may drive this booking from its current status
    /// to `to`. This is the single authorization predicate for the whole
    /// lifecycle table; routes never re-implement it.
    pub fn authorize_transition(
        &self,
        to: BookingStatus,
        actor: &Actor,
        lot_owner_id: i32,
    ) -> DomainResult<()> {
        use BookingStatus::*;
        let allowed = match to {
            Confirmed | Active | Completed => matches!(actor, Actor::Owner(id) if *id == lot_owner_id),
            Paid | Refunded => matches!(actor, Actor::Gateway),
            Cancelled => match actor {
                // Drivers may only back out before the owner has confirmed.
                Actor::Driver(id) => *id == self.driver_id && self.status == Pending,
                Actor::Owner(id) => *id == lot_owner_id,
                Actor::Gateway => false,
            },
            Pending => false,
        };
        if !allowed {
            return Err(DomainError::Forbidden(format!(
                "actor is not allowed to move booking {} to {}",
                self.id, to
            )));
        }
        Ok(())
    }

    /// Validate legality and authorization of a transition, returning the
    /// target status to apply. Does not mutate; persistence applies the
    /// change conditionally on the current status.
    pub fn transition(
        &self,
        to: BookingStatus,
        actor: &Actor,
        lot_owner_id: i32,
    ) -> DomainResult<BookingStatus> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::IllegalTransition {
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }
        self.authorize_transition(to, actor, lot_owner_id)?;
        Ok(to)
    }

    /// Whether `actor` may view this booking.
    pub fn viewable_by(&self, actor: &Actor, lot_owner_id: i32) -> bool {
        match actor {
            Actor::Driver(id) => *id == self.driver_id,
            Actor::Owner(id) => *id == lot_owner_id,
            Actor::Gateway => true,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
