//! Booking repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Booking, BookingStatus};
use crate::domain::DomainResult;
use crate::shared::types::pagination::{Page, PaginationParams};

/// Input for the admission path. The window is assumed pre-validated;
/// capacity and lot checks happen inside `admit`.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub driver_id: i32,
    pub lot_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub total_price_cents: i64,
    pub vehicle_info: Option<String>,
    pub notes: Option<String>,
}

/// Replacement window for a still-pending booking.
#[derive(Debug, Clone)]
pub struct WindowChange {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub total_price_cents: i64,
}

/// Timestamps stamped together with specific status transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionStamps {
    pub payment_completed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Admission check + insert as one atomic unit: counts half-open
    /// window overlaps against the lot's available spaces, then inserts
    /// the PENDING row. Returns `CapacityExceeded` when the window is
    /// fully booked, `NotFound` / `Validation` when the lot is missing
    /// or inactive.
    ///
    /// Implementations must guarantee that two concurrent calls for the
    /// same lot and overlapping windows cannot both slip past a
    /// capacity boundary only one of them fits under.
    async fn admit(&self, booking: NewBooking) -> DomainResult<Booking>;

    /// Re-run the admission check for a new window, excluding the booking
    /// itself from the overlap count, and persist the new window/price.
    /// Same atomicity contract as `admit`.
    async fn reschedule(&self, booking_id: i32, change: WindowChange) -> DomainResult<Booking>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Booking>>;

    /// Conditionally move `id` from `from` to `to`, stamping timestamps.
    /// Fails with `IllegalTransition` if the stored status is no longer
    /// `from` (lost race with a concurrent transition).
    async fn transition_status(
        &self,
        id: i32,
        from: BookingStatus,
        to: BookingStatus,
        stamps: TransitionStamps,
    ) -> DomainResult<Booking>;

    /// Update driver-editable fields (vehicle info, notes) only.
    async fn update_details(
        &self,
        id: i32,
        vehicle_info: Option<String>,
        notes: Option<String>,
    ) -> DomainResult<Booking>;

    /// Store the payment-intent reference (idempotency key for the
    /// gateway's confirmation callback).
    async fn set_payment_intent(&self, id: i32, intent_id: &str) -> DomainResult<Booking>;

    async fn find_by_payment_intent(&self, intent_id: &str) -> DomainResult<Option<Booking>>;

    /// Hard delete. Callers enforce the pending-and-own rule.
    async fn delete(&self, id: i32) -> DomainResult<()>;

    /// Driver's bookings, newest first, optionally filtered by status.
    async fn list_for_driver(
        &self,
        driver_id: i32,
        status: Option<BookingStatus>,
        page: PaginationParams,
    ) -> DomainResult<Page<Booking>>;

    /// Bookings across all lots owned by `owner_id`, newest first.
    async fn list_for_owner(
        &self,
        owner_id: i32,
        status: Option<BookingStatus>,
        page: PaginationParams,
    ) -> DomainResult<Page<Booking>>;

    /// Paid bookings of a driver, most recently paid first.
    async fn list_paid_for_driver(&self, driver_id: i32) -> DomainResult<Vec<Booking>>;
}
