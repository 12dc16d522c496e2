//! Reservation engine
//!
//! The admission path (validate window, count overlapping occupying
//! bookings against the lot's available spaces, insert) lives in the
//! repository so the check and the insert share one transaction; this
//! service owns everything around it: eligibility, pricing, the
//! lifecycle transitions and the notification fan-out they trigger.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};

use crate::domain::booking::{
    duration_minutes, total_price_cents, validate_window, Booking, BookingStatus, NewBooking,
    TransitionStamps, WindowChange,
};
use crate::domain::lot::Lot;
use crate::domain::notification::NotificationKind;
use crate::domain::{Actor, DomainError, DomainResult, RepositoryProvider};
use crate::shared::types::pagination::{Page, PaginationParams};

use super::notification::NotificationService;

/// Request to create a booking.
#[derive(Debug, Clone)]
pub struct CreateBookingCommand {
    pub lot_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub vehicle_info: Option<String>,
    pub notes: Option<String>,
}

/// Driver-initiated edit of a still-pending booking. A new window
/// triggers re-admission and re-pricing at the lot's current rate.
#[derive(Debug, Clone, Default)]
pub struct UpdateBookingCommand {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub vehicle_info: Option<String>,
    pub notes: Option<String>,
}

/// Service for booking admission and lifecycle operations
pub struct ReservationService {
    repos: Arc<dyn RepositoryProvider>,
    notifier: Arc<NotificationService>,
}

impl ReservationService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, notifier: Arc<NotificationService>) -> Self {
        Self { repos, notifier }
    }

    async fn find_booking(&self, id: i32) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Booking",
                field: "id",
                value: id.to_string(),
            })
    }

    async fn find_lot(&self, lot_id: i32) -> DomainResult<Lot> {
        self.repos
            .lots()
            .find_by_id(lot_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "ParkingLot",
                field: "id",
                value: lot_id.to_string(),
            })
    }

    /// Notification failures are logged, never surfaced to the caller:
    /// the booking operation already succeeded.
    async fn fan_out(
        &self,
        user_id: i32,
        kind: NotificationKind,
        title: &str,
        message: String,
        booking: &Booking,
    ) {
        let payload = serde_json::json!({
            "bookingId": booking.id,
            "lotId": booking.lot_id,
            "status": booking.status.as_str(),
        });
        if let Err(e) = self
            .notifier
            .notify(user_id, kind, title, message, Some(payload))
            .await
        {
            error!("Failed to notify user {} about booking {}: {}", user_id, booking.id, e);
        }
    }

    /// Admit a new booking: validate the window, price it at the lot's
    /// current rate, run the overlap check atomically with the insert,
    /// then notify both parties.
    pub async fn create_booking(
        &self,
        actor: &Actor,
        cmd: CreateBookingCommand,
    ) -> DomainResult<Booking> {
        let driver_id = match actor {
            Actor::Driver(id) => *id,
            _ => {
                return Err(DomainError::Forbidden(
                    "only drivers may create bookings".to_string(),
                ))
            }
        };

        validate_window(cmd.start_time, cmd.end_time, Utc::now())?;

        let lot = self.find_lot(cmd.lot_id).await?;
        if !lot.is_active {
            return Err(DomainError::Validation(
                "Parking lot is not active".to_string(),
            ));
        }
        if lot.available_spaces <= 0 {
            metrics::counter!("parkwise_bookings_rejected_total").increment(1);
            return Err(DomainError::CapacityExceeded { lot_id: lot.id });
        }

        let minutes = duration_minutes(cmd.start_time, cmd.end_time);
        let price = total_price_cents(minutes, lot.price_per_hour_cents);

        let result = self
            .repos
            .bookings()
            .admit(NewBooking {
                driver_id,
                lot_id: lot.id,
                start_time: cmd.start_time,
                end_time: cmd.end_time,
                duration_minutes: minutes,
                total_price_cents: price,
                vehicle_info: cmd.vehicle_info,
                notes: cmd.notes,
            })
            .await;

        let booking = match result {
            Ok(b) => b,
            Err(e) => {
                if matches!(e, DomainError::CapacityExceeded { .. }) {
                    metrics::counter!("parkwise_bookings_rejected_total").increment(1);
                    warn!("Admission rejected for lot {}: window fully booked", lot.id);
                }
                return Err(e);
            }
        };

        metrics::counter!("parkwise_bookings_admitted_total").increment(1);
        info!(
            "Booking {} admitted: driver {} at lot {} for {} min",
            booking.id, driver_id, lot.id, minutes
        );

        self.fan_out(
            lot.owner_id,
            NotificationKind::BookingCreated,
            "New Booking Request",
            format!("A driver has requested to book {}", lot.name),
            &booking,
        )
        .await;
        self.fan_out(
            driver_id,
            NotificationKind::BookingCreated,
            "Booking Request Submitted",
            format!("Your booking request for {} is pending approval", lot.name),
            &booking,
        )
        .await;

        Ok(booking)
    }

    /// Edit a pending booking. Only the owning driver, only while
    /// `PENDING`; a changed window is re-admitted (excluding this booking
    /// from its own overlap count) and re-priced.
    pub async fn update_booking(
        &self,
        actor: &Actor,
        booking_id: i32,
        cmd: UpdateBookingCommand,
    ) -> DomainResult<Booking> {
        let booking = self.find_booking(booking_id).await?;
        match actor {
            Actor::Driver(id) if *id == booking.driver_id => {}
            _ => {
                return Err(DomainError::Forbidden(
                    "booking belongs to another driver".to_string(),
                ))
            }
        }
        if booking.status != BookingStatus::Pending {
            return Err(DomainError::NotMutable(booking_id));
        }

        let window_changed = cmd.start_time.is_some() || cmd.end_time.is_some();
        let updated = if window_changed {
            let start = cmd.start_time.unwrap_or(booking.start_time);
            let end = cmd.end_time.unwrap_or(booking.end_time);
            validate_window(start, end, Utc::now())?;

            let lot = self.find_lot(booking.lot_id).await?;
            let minutes = duration_minutes(start, end);
            let updated = self
                .repos
                .bookings()
                .reschedule(
                    booking_id,
                    WindowChange {
                        start_time: start,
                        end_time: end,
                        duration_minutes: minutes,
                        total_price_cents: total_price_cents(minutes, lot.price_per_hour_cents),
                    },
                )
                .await?;
            info!("Booking {} rescheduled to [{}, {})", booking_id, start, end);
            updated
        } else {
            booking
        };

        if cmd.vehicle_info.is_some() || cmd.notes.is_some() {
            return self
                .repos
                .bookings()
                .update_details(booking_id, cmd.vehicle_info, cmd.notes)
                .await;
        }
        Ok(updated)
    }

    /// Delete a booking. Permitted only for a `PENDING` booking deleted
    /// by its own driver; anything later in the lifecycle is cancelled,
    /// not deleted.
    pub async fn delete_booking(&self, actor: &Actor, booking_id: i32) -> DomainResult<()> {
        let booking = self.find_booking(booking_id).await?;
        match actor {
            Actor::Driver(id) if *id == booking.driver_id => {}
            _ => {
                return Err(DomainError::Forbidden(
                    "booking belongs to another driver".to_string(),
                ))
            }
        }
        if booking.status != BookingStatus::Pending {
            return Err(DomainError::NotMutable(booking_id));
        }
        self.repos.bookings().delete(booking_id).await
    }

    /// Drive a lifecycle transition. Legality and authorization are
    /// decided by the state machine; persistence applies the change
    /// conditionally so a concurrent transition loses cleanly.
    pub async fn transition(
        &self,
        actor: &Actor,
        booking_id: i32,
        target: BookingStatus,
    ) -> DomainResult<Booking> {
        let booking = self.find_booking(booking_id).await?;
        let lot = self.find_lot(booking.lot_id).await?;

        let target = booking.transition(target, actor, lot.owner_id)?;
        let updated = self
            .repos
            .bookings()
            .transition_status(booking_id, booking.status, target, TransitionStamps::default())
            .await?;

        info!(
            "Booking {} moved {} -> {}",
            booking_id, booking.status, target
        );

        match target {
            BookingStatus::Confirmed => {
                self.fan_out(
                    updated.driver_id,
                    NotificationKind::BookingConfirmed,
                    "Booking Confirmed",
                    format!("Your booking for {} has been confirmed", lot.name),
                    &updated,
                )
                .await;
            }
            BookingStatus::Active => {
                self.fan_out(
                    updated.driver_id,
                    NotificationKind::BookingConfirmed,
                    "Booking Active",
                    format!("Your booking at {} is now active", lot.name),
                    &updated,
                )
                .await;
            }
            BookingStatus::Completed => {
                self.fan_out(
                    updated.driver_id,
                    NotificationKind::BookingCompleted,
                    "Booking Completed",
                    format!("Your booking at {} has been completed", lot.name),
                    &updated,
                )
                .await;
            }
            BookingStatus::Cancelled => {
                // Notify the party that did not initiate the cancellation.
                let (recipient, message) = match actor {
                    Actor::Driver(_) => (
                        lot.owner_id,
                        format!("A booking for {} has been cancelled by the driver", lot.name),
                    ),
                    _ => (
                        updated.driver_id,
                        format!("Your booking for {} has been cancelled", lot.name),
                    ),
                };
                self.fan_out(
                    recipient,
                    NotificationKind::BookingCancelled,
                    "Booking Cancelled",
                    message,
                    &updated,
                )
                .await;
            }
            _ => {}
        }

        Ok(updated)
    }

    /// Fetch a booking, visible to its driver and the lot's owner only.
    pub async fn get_booking(&self, actor: &Actor, booking_id: i32) -> DomainResult<Booking> {
        let booking = self.find_booking(booking_id).await?;
        let lot = self.find_lot(booking.lot_id).await?;
        if !booking.viewable_by(actor, lot.owner_id) {
            return Err(DomainError::Forbidden(
                "booking is not visible to this user".to_string(),
            ));
        }
        Ok(booking)
    }

    pub async fn list_driver_bookings(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
        page: PaginationParams,
    ) -> DomainResult<Page<Booking>> {
        match actor {
            Actor::Driver(id) => self.repos.bookings().list_for_driver(*id, status, page).await,
            _ => Err(DomainError::Forbidden(
                "driver listing requires a driver identity".to_string(),
            )),
        }
    }

    pub async fn list_owner_bookings(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
        page: PaginationParams,
    ) -> DomainResult<Page<Booking>> {
        match actor {
            Actor::Owner(id) => self.repos.bookings().list_for_owner(*id, status, page).await,
            _ => Err(DomainError::Forbidden(
                "owner listing requires an owner identity".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::services::lot::{CreateLotCommand, LotService};
    use crate::application::session::ConnectionRegistry;
    use crate::infrastructure::storage::memory::MemoryRepositoryProvider;
    use chrono::Duration;

    struct Fixture {
        reservations: ReservationService,
        lots: LotService,
        notifier: Arc<NotificationService>,
    }

    fn fixture() -> Fixture {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(MemoryRepositoryProvider::new());
        let notifier = Arc::new(NotificationService::new(
            repos.clone(),
            create_event_bus(),
            ConnectionRegistry::shared(),
        ));
        Fixture {
            reservations: ReservationService::new(repos.clone(), notifier.clone()),
            lots: LotService::new(repos, notifier.clone()),
            notifier,
        }
    }

    async fn make_lot(f: &Fixture, owner: i32, spaces: i32) -> Lot {
        f.lots
            .create_lot(
                &Actor::Owner(owner),
                CreateLotCommand {
                    name: "Test Lot".to_string(),
                    address: "1 Test St".to_string(),
                    total_spaces: spaces,
                    price_per_hour_cents: 300,
                },
            )
            .await
            .unwrap()
    }

    fn window(hours_from_now: i64, hours_long: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc::now() + Duration::hours(hours_from_now);
        (start, start + Duration::hours(hours_long))
    }

    fn booking_cmd(lot_id: i32, start: DateTime<Utc>, end: DateTime<Utc>) -> CreateBookingCommand {
        CreateBookingCommand {
            lot_id,
            start_time: start,
            end_time: end,
            vehicle_info: Some("ABC-123".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn admission_prices_at_current_rate() {
        let f = fixture();
        let lot = make_lot(&f, 1, 5).await;
        let (start, end) = window(1, 2);

        let booking = f
            .reservations
            .create_booking(&Actor::Driver(10), booking_cmd(lot.id, start, end))
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.duration_minutes, 120);
        assert_eq!(booking.total_price_cents, 600);
    }

    #[tokio::test]
    async fn admission_notifies_owner_and_driver() {
        let f = fixture();
        let lot = make_lot(&f, 1, 5).await;
        let (start, end) = window(1, 2);

        f.reservations
            .create_booking(&Actor::Driver(10), booking_cmd(lot.id, start, end))
            .await
            .unwrap();

        assert_eq!(f.notifier.list_for_user(1, 10).await.unwrap().len(), 1);
        assert_eq!(f.notifier.list_for_user(10, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn overlapping_bookings_fill_capacity() {
        let f = fixture();
        let lot = make_lot(&f, 1, 2).await;
        let (start, end) = window(1, 2);

        for driver in [10, 11] {
            f.reservations
                .create_booking(&Actor::Driver(driver), booking_cmd(lot.id, start, end))
                .await
                .unwrap();
        }

        let err = f
            .reservations
            .create_booking(&Actor::Driver(12), booking_cmd(lot.id, start, end))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::CapacityExceeded { .. }));
    }

    #[tokio::test]
    async fn back_to_back_windows_do_not_contend() {
        let f = fixture();
        let lot = make_lot(&f, 1, 1).await;
        let (start, end) = window(1, 2);

        f.reservations
            .create_booking(&Actor::Driver(10), booking_cmd(lot.id, start, end))
            .await
            .unwrap();
        // second window starts exactly when the first ends
        f.reservations
            .create_booking(&Actor::Driver(11), booking_cmd(lot.id, end, end + Duration::hours(2)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_bookings_free_the_slot() {
        let f = fixture();
        let lot = make_lot(&f, 1, 1).await;
        let (start, end) = window(1, 2);

        let b = f
            .reservations
            .create_booking(&Actor::Driver(10), booking_cmd(lot.id, start, end))
            .await
            .unwrap();
        f.reservations
            .transition(&Actor::Driver(10), b.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        f.reservations
            .create_booking(&Actor::Driver(11), booking_cmd(lot.id, start, end))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn concurrent_admissions_respect_capacity() {
        let f = fixture();
        let lot = make_lot(&f, 1, 3).await;
        let (start, end) = window(1, 2);

        let reservations = Arc::new(f.reservations);
        let mut handles = Vec::new();
        for driver in 0..10 {
            let svc = reservations.clone();
            let cmd = booking_cmd(lot.id, start, end);
            handles.push(tokio::spawn(async move {
                svc.create_booking(&Actor::Driver(driver), cmd).await
            }));
        }

        let mut admitted = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(DomainError::CapacityExceeded { .. }) => rejected += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(admitted, 3);
        assert_eq!(rejected, 7);
    }

    #[tokio::test]
    async fn zero_available_spaces_rejects_outright() {
        let f = fixture();
        let owner = Actor::Owner(1);
        let lot = make_lot(&f, 1, 3).await;
        f.lots.set_available_spaces(&owner, lot.id, 0).await.unwrap();

        let (start, end) = window(1, 2);
        let err = f
            .reservations
            .create_booking(&Actor::Driver(10), booking_cmd(lot.id, start, end))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::CapacityExceeded { .. }));
    }

    #[tokio::test]
    async fn reschedule_reprices_and_readmits() {
        let f = fixture();
        let owner = Actor::Owner(1);
        let driver = Actor::Driver(10);
        let lot = make_lot(&f, 1, 1).await;
        let (start, end) = window(1, 2);

        let b = f
            .reservations
            .create_booking(&driver, booking_cmd(lot.id, start, end))
            .await
            .unwrap();

        // a rate change after creation must not touch the frozen price
        f.lots
            .update_lot(
                &owner,
                lot.id,
                crate::domain::lot::LotChanges {
                    price_per_hour_cents: Some(600),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let unchanged = f.reservations.get_booking(&driver, b.id).await.unwrap();
        assert_eq!(unchanged.total_price_cents, 600);

        // rescheduling re-prices at the new rate
        let updated = f
            .reservations
            .update_booking(
                &driver,
                b.id,
                UpdateBookingCommand {
                    start_time: Some(start + Duration::hours(4)),
                    end_time: Some(end + Duration::hours(4)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.total_price_cents, 1200);
    }

    #[tokio::test]
    async fn reschedule_does_not_collide_with_itself() {
        let f = fixture();
        let driver = Actor::Driver(10);
        let lot = make_lot(&f, 1, 1).await;
        let (start, end) = window(1, 2);

        let b = f
            .reservations
            .create_booking(&driver, booking_cmd(lot.id, start, end))
            .await
            .unwrap();

        // shifting within its own window must not count itself as overlap
        f.reservations
            .update_booking(
                &driver,
                b.id,
                UpdateBookingCommand {
                    start_time: Some(start + Duration::minutes(30)),
                    end_time: Some(end + Duration::minutes(30)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_pending_bookings_are_immutable() {
        let f = fixture();
        let owner = Actor::Owner(1);
        let driver = Actor::Driver(10);
        let lot = make_lot(&f, 1, 1).await;
        let (start, end) = window(1, 2);

        let b = f
            .reservations
            .create_booking(&driver, booking_cmd(lot.id, start, end))
            .await
            .unwrap();
        f.reservations
            .transition(&owner, b.id, BookingStatus::Confirmed)
            .await
            .unwrap();

        let err = f
            .reservations
            .update_booking(
                &driver,
                b.id,
                UpdateBookingCommand {
                    notes: Some("late".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotMutable(_)));

        let err = f.reservations.delete_booking(&driver, b.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotMutable(_)));
    }

    #[tokio::test]
    async fn confirm_notifies_driver() {
        let f = fixture();
        let owner = Actor::Owner(1);
        let driver = Actor::Driver(10);
        let lot = make_lot(&f, 1, 1).await;
        let (start, end) = window(1, 2);

        let b = f
            .reservations
            .create_booking(&driver, booking_cmd(lot.id, start, end))
            .await
            .unwrap();
        f.reservations
            .transition(&owner, b.id, BookingStatus::Confirmed)
            .await
            .unwrap();

        let driver_inbox = f.notifier.list_for_user(10, 10).await.unwrap();
        assert!(driver_inbox
            .iter()
            .any(|n| n.kind == NotificationKind::BookingConfirmed));
    }

    #[tokio::test]
    async fn driver_cancellation_notifies_owner() {
        let f = fixture();
        let driver = Actor::Driver(10);
        let lot = make_lot(&f, 1, 1).await;
        let (start, end) = window(1, 2);

        let b = f
            .reservations
            .create_booking(&driver, booking_cmd(lot.id, start, end))
            .await
            .unwrap();
        f.reservations
            .transition(&driver, b.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        let owner_inbox = f.notifier.list_for_user(1, 10).await.unwrap();
        assert!(owner_inbox
            .iter()
            .any(|n| n.kind == NotificationKind::BookingCancelled));
    }

    #[tokio::test]
    async fn stranger_cannot_view_booking() {
        let f = fixture();
        let lot = make_lot(&f, 1, 1).await;
        let (start, end) = window(1, 2);

        let b = f
            .reservations
            .create_booking(&Actor::Driver(10), booking_cmd(lot.id, start, end))
            .await
            .unwrap();

        let err = f
            .reservations
            .get_booking(&Actor::Driver(99), b.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        // the lot's owner can see it
        f.reservations.get_booking(&Actor::Owner(1), b.id).await.unwrap();
    }
}
