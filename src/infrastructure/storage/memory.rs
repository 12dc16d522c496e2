//! In-memory implementation of the repository traits
//!
//! Backs unit tests and ephemeral dev runs. The admission lock is a
//! plain mutex held across the overlap count and the insert; no await
//! happens while it is held, which gives the same check-then-insert
//! atomicity the SQL backend gets from its transaction.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::domain::booking::{
    Booking, BookingRepository, BookingStatus, NewBooking, TransitionStamps, WindowChange,
    OCCUPYING_STATUSES,
};
use crate::domain::lot::{CapacityAuditEntry, Lot, LotChanges, LotRepository, NewLot};
use crate::domain::notification::{Notification, NotificationRepository};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};
use crate::shared::types::pagination::{Page, PaginationParams};

#[derive(Default)]
struct MemoryState {
    lots: DashMap<i32, Lot>,
    bookings: DashMap<i32, Booking>,
    audits: DashMap<i32, CapacityAuditEntry>,
    notifications: DashMap<String, Notification>,
    next_lot_id: AtomicI32,
    next_booking_id: AtomicI32,
    next_audit_id: AtomicI32,
    /// Serializes check-then-insert admission paths.
    admission_lock: Mutex<()>,
}

impl MemoryState {
    fn lot_not_found(id: i32) -> DomainError {
        DomainError::NotFound {
            entity: "ParkingLot",
            field: "id",
            value: id.to_string(),
        }
    }

    fn booking_not_found(id: i32) -> DomainError {
        DomainError::NotFound {
            entity: "Booking",
            field: "id",
            value: id.to_string(),
        }
    }

    fn count_overlaps(&self, lot_id: i32, booking: &NewBooking, exclude: Option<i32>) -> usize {
        self.bookings
            .iter()
            .filter(|b| b.lot_id == lot_id)
            .filter(|b| exclude != Some(b.id))
            .filter(|b| OCCUPYING_STATUSES.contains(&b.status))
            .filter(|b| b.overlaps(booking.start_time, booking.end_time))
            .count()
    }
}

/// All repositories over one shared in-memory state.
pub struct MemoryRepositoryProvider {
    lots: MemoryLotRepository,
    bookings: MemoryBookingRepository,
    notifications: MemoryNotificationRepository,
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        let state = Arc::new(MemoryState::default());
        Self {
            lots: MemoryLotRepository {
                state: state.clone(),
            },
            bookings: MemoryBookingRepository {
                state: state.clone(),
            },
            notifications: MemoryNotificationRepository { state },
        }
    }
}

impl Default for MemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for MemoryRepositoryProvider {
    fn lots(&self) -> &dyn LotRepository {
        &self.lots
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn notifications(&self) -> &dyn NotificationRepository {
        &self.notifications
    }
}

// ── Lots ────────────────────────────────────────────────────────

struct MemoryLotRepository {
    state: Arc<MemoryState>,
}

#[async_trait]
impl LotRepository for MemoryLotRepository {
    async fn insert(&self, l: NewLot) -> DomainResult<Lot> {
        let id = self.state.next_lot_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let lot = Lot {
            id,
            owner_id: l.owner_id,
            name: l.name,
            address: l.address,
            total_spaces: l.total_spaces,
            available_spaces: l.total_spaces,
            price_per_hour_cents: l.price_per_hour_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state.lots.insert(id, lot.clone());
        Ok(lot)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Lot>> {
        Ok(self.state.lots.get(&id).map(|l| l.clone()))
    }

    async fn find_by_owner(&self, owner_id: i32) -> DomainResult<Vec<Lot>> {
        let mut lots: Vec<Lot> = self
            .state
            .lots
            .iter()
            .filter(|l| l.owner_id == owner_id)
            .map(|l| l.clone())
            .collect();
        lots.sort_by_key(|l| std::cmp::Reverse(l.id));
        Ok(lots)
    }

    async fn find_all_active(&self) -> DomainResult<Vec<Lot>> {
        let mut lots: Vec<Lot> = self
            .state
            .lots
            .iter()
            .filter(|l| l.is_active)
            .map(|l| l.clone())
            .collect();
        lots.sort_by_key(|l| std::cmp::Reverse(l.id));
        Ok(lots)
    }

    async fn update(&self, id: i32, changes: LotChanges) -> DomainResult<Lot> {
        let mut lot = self
            .state
            .lots
            .get_mut(&id)
            .ok_or_else(|| MemoryState::lot_not_found(id))?;
        if let Some(name) = changes.name {
            lot.name = name;
        }
        if let Some(address) = changes.address {
            lot.address = address;
        }
        if let Some(price) = changes.price_per_hour_cents {
            lot.price_per_hour_cents = price;
        }
        if let Some(is_active) = changes.is_active {
            lot.is_active = is_active;
        }
        lot.updated_at = Utc::now();
        Ok(lot.clone())
    }

    async fn set_available_spaces(
        &self,
        lot_id: i32,
        new_available: i32,
    ) -> DomainResult<(Lot, CapacityAuditEntry)> {
        let mut lot = self
            .state
            .lots
            .get_mut(&lot_id)
            .ok_or_else(|| MemoryState::lot_not_found(lot_id))?;
        lot.check_available(new_available)?;

        let previous = lot.available_spaces;
        lot.available_spaces = new_available;
        lot.updated_at = Utc::now();

        let id = self.state.next_audit_id.fetch_add(1, Ordering::SeqCst) + 1;
        let entry = CapacityAuditEntry {
            id,
            lot_id,
            previous_spaces: previous,
            new_spaces: new_available,
            created_at: Utc::now(),
        };
        self.state.audits.insert(id, entry.clone());
        Ok((lot.clone(), entry))
    }

    async fn capacity_history(
        &self,
        lot_id: i32,
        limit: u64,
    ) -> DomainResult<Vec<CapacityAuditEntry>> {
        let mut entries: Vec<CapacityAuditEntry> = self
            .state
            .audits
            .iter()
            .filter(|a| a.lot_id == lot_id)
            .map(|a| a.clone())
            .collect();
        entries.sort_by_key(|a| std::cmp::Reverse(a.id));
        entries.truncate(limit as usize);
        Ok(entries)
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        self.state
            .lots
            .remove(&id)
            .ok_or_else(|| MemoryState::lot_not_found(id))?;
        Ok(())
    }
}

// ── Bookings ────────────────────────────────────────────────────

struct MemoryBookingRepository {
    state: Arc<MemoryState>,
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn admit(&self, b: NewBooking) -> DomainResult<Booking> {
        let state = &self.state;
        // Held across the count and the insert; nothing awaits inside.
        let _guard = state.admission_lock.lock().unwrap_or_else(|e| e.into_inner());

        let lot = state
            .lots
            .get(&b.lot_id)
            .ok_or_else(|| MemoryState::lot_not_found(b.lot_id))?;
        if !lot.is_active {
            return Err(DomainError::Validation(
                "Parking lot is not active".to_string(),
            ));
        }
        let available = lot.available_spaces.max(0) as usize;
        drop(lot);

        if state.count_overlaps(b.lot_id, &b, None) >= available {
            return Err(DomainError::CapacityExceeded { lot_id: b.lot_id });
        }

        let id = state.next_booking_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let booking = Booking {
            id,
            driver_id: b.driver_id,
            lot_id: b.lot_id,
            start_time: b.start_time,
            end_time: b.end_time,
            duration_minutes: b.duration_minutes,
            total_price_cents: b.total_price_cents,
            status: BookingStatus::Pending,
            vehicle_info: b.vehicle_info,
            notes: b.notes,
            payment_intent_id: None,
            payment_completed_at: None,
            refunded_at: None,
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert(id, booking.clone());
        Ok(booking)
    }

    async fn reschedule(&self, booking_id: i32, change: WindowChange) -> DomainResult<Booking> {
        let state = &self.state;
        let _guard = state.admission_lock.lock().unwrap_or_else(|e| e.into_inner());

        let existing = state
            .bookings
            .get(&booking_id)
            .map(|b| b.clone())
            .ok_or_else(|| MemoryState::booking_not_found(booking_id))?;
        if existing.status != BookingStatus::Pending {
            return Err(DomainError::NotMutable(booking_id));
        }
        let lot = state
            .lots
            .get(&existing.lot_id)
            .map(|l| l.clone())
            .ok_or_else(|| MemoryState::lot_not_found(existing.lot_id))?;

        let probe = NewBooking {
            driver_id: existing.driver_id,
            lot_id: existing.lot_id,
            start_time: change.start_time,
            end_time: change.end_time,
            duration_minutes: change.duration_minutes,
            total_price_cents: change.total_price_cents,
            vehicle_info: None,
            notes: None,
        };
        let available = lot.available_spaces.max(0) as usize;
        if state.count_overlaps(existing.lot_id, &probe, Some(booking_id)) >= available {
            return Err(DomainError::CapacityExceeded {
                lot_id: existing.lot_id,
            });
        }

        let mut booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| MemoryState::booking_not_found(booking_id))?;
        // transition_status does not take the admission lock, so the
        // status is re-checked under the entry lock before mutating.
        if booking.status != BookingStatus::Pending {
            return Err(DomainError::NotMutable(booking_id));
        }
        booking.start_time = change.start_time;
        booking.end_time = change.end_time;
        booking.duration_minutes = change.duration_minutes;
        booking.total_price_cents = change.total_price_cents;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Booking>> {
        Ok(self.state.bookings.get(&id).map(|b| b.clone()))
    }

    async fn transition_status(
        &self,
        id: i32,
        from: BookingStatus,
        to: BookingStatus,
        stamps: TransitionStamps,
    ) -> DomainResult<Booking> {
        let mut booking = self
            .state
            .bookings
            .get_mut(&id)
            .ok_or_else(|| MemoryState::booking_not_found(id))?;
        if booking.status != from {
            return Err(DomainError::IllegalTransition {
                from: from.as_str(),
                to: to.as_str(),
            });
        }
        booking.status = to;
        if let Some(ts) = stamps.payment_completed_at {
            booking.payment_completed_at = Some(ts);
        }
        if let Some(ts) = stamps.refunded_at {
            booking.refunded_at = Some(ts);
        }
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn update_details(
        &self,
        id: i32,
        vehicle_info: Option<String>,
        notes: Option<String>,
    ) -> DomainResult<Booking> {
        let mut booking = self
            .state
            .bookings
            .get_mut(&id)
            .ok_or_else(|| MemoryState::booking_not_found(id))?;
        if let Some(v) = vehicle_info {
            booking.vehicle_info = Some(v);
        }
        if let Some(n) = notes {
            booking.notes = Some(n);
        }
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn set_payment_intent(&self, id: i32, intent_id: &str) -> DomainResult<Booking> {
        let mut booking = self
            .state
            .bookings
            .get_mut(&id)
            .ok_or_else(|| MemoryState::booking_not_found(id))?;
        booking.payment_intent_id = Some(intent_id.to_string());
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn find_by_payment_intent(&self, intent_id: &str) -> DomainResult<Option<Booking>> {
        Ok(self
            .state
            .bookings
            .iter()
            .find(|b| b.payment_intent_id.as_deref() == Some(intent_id))
            .map(|b| b.clone()))
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        self.state
            .bookings
            .remove(&id)
            .ok_or_else(|| MemoryState::booking_not_found(id))?;
        Ok(())
    }

    async fn list_for_driver(
        &self,
        driver_id: i32,
        status: Option<BookingStatus>,
        page: PaginationParams,
    ) -> DomainResult<Page<Booking>> {
        let page = page.clamped();
        let mut all: Vec<Booking> = self
            .state
            .bookings
            .iter()
            .filter(|b| b.driver_id == driver_id)
            .filter(|b| status.map(|s| b.status == s).unwrap_or(true))
            .map(|b| b.clone())
            .collect();
        all.sort_by_key(|b| std::cmp::Reverse(b.id));

        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok(Page::new(items, total, &page))
    }

    async fn list_for_owner(
        &self,
        owner_id: i32,
        status: Option<BookingStatus>,
        page: PaginationParams,
    ) -> DomainResult<Page<Booking>> {
        let page = page.clamped();
        let lot_ids: Vec<i32> = self
            .state
            .lots
            .iter()
            .filter(|l| l.owner_id == owner_id)
            .map(|l| l.id)
            .collect();

        let mut all: Vec<Booking> = self
            .state
            .bookings
            .iter()
            .filter(|b| lot_ids.contains(&b.lot_id))
            .filter(|b| status.map(|s| b.status == s).unwrap_or(true))
            .map(|b| b.clone())
            .collect();
        all.sort_by_key(|b| std::cmp::Reverse(b.id));

        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok(Page::new(items, total, &page))
    }

    async fn list_paid_for_driver(&self, driver_id: i32) -> DomainResult<Vec<Booking>> {
        let mut paid: Vec<Booking> = self
            .state
            .bookings
            .iter()
            .filter(|b| b.driver_id == driver_id && b.payment_completed_at.is_some())
            .map(|b| b.clone())
            .collect();
        paid.sort_by_key(|b| std::cmp::Reverse(b.payment_completed_at));
        Ok(paid)
    }
}

// ── Notifications ───────────────────────────────────────────────

struct MemoryNotificationRepository {
    state: Arc<MemoryState>,
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn insert(&self, n: Notification) -> DomainResult<()> {
        self.state.notifications.insert(n.id.clone(), n);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Notification>> {
        Ok(self.state.notifications.get(id).map(|n| n.clone()))
    }

    async fn list_for_user(&self, user_id: i32, limit: u64) -> DomainResult<Vec<Notification>> {
        let mut all: Vec<Notification> = self
            .state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.clone())
            .collect();
        all.sort_by_key(|n| std::cmp::Reverse(n.created_at));
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn mark_read(&self, id: &str) -> DomainResult<()> {
        let mut n = self
            .state
            .notifications
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound {
                entity: "Notification",
                field: "id",
                value: id.to_string(),
            })?;
        n.read = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_booking(lot_id: i32, driver_id: i32, offset_h: i64, len_h: i64) -> NewBooking {
        let start = Utc::now() + Duration::hours(offset_h);
        NewBooking {
            driver_id,
            lot_id,
            start_time: start,
            end_time: start + Duration::hours(len_h),
            duration_minutes: (len_h * 60) as i32,
            total_price_cents: 0,
            vehicle_info: None,
            notes: None,
        }
    }

    async fn lot_with_spaces(provider: &MemoryRepositoryProvider, spaces: i32) -> Lot {
        provider
            .lots()
            .insert(NewLot {
                owner_id: 1,
                name: "L".to_string(),
                address: "A".to_string(),
                total_spaces: spaces,
                price_per_hour_cents: 100,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn admit_rejects_when_window_is_full() {
        let provider = MemoryRepositoryProvider::new();
        let lot = lot_with_spaces(&provider, 1).await;

        provider.bookings().admit(new_booking(lot.id, 1, 1, 2)).await.unwrap();
        let err = provider
            .bookings()
            .admit(new_booking(lot.id, 2, 1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::CapacityExceeded { .. }));
    }

    #[tokio::test]
    async fn transition_status_detects_lost_race() {
        let provider = MemoryRepositoryProvider::new();
        let lot = lot_with_spaces(&provider, 1).await;
        let b = provider.bookings().admit(new_booking(lot.id, 1, 1, 2)).await.unwrap();

        provider
            .bookings()
            .transition_status(
                b.id,
                BookingStatus::Pending,
                BookingStatus::Cancelled,
                TransitionStamps::default(),
            )
            .await
            .unwrap();

        // the same conditional transition now fails
        let err = provider
            .bookings()
            .transition_status(
                b.id,
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                TransitionStamps::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn reschedule_refuses_a_booking_that_moved_on() {
        let provider = MemoryRepositoryProvider::new();
        let lot = lot_with_spaces(&provider, 2).await;
        let b = provider.bookings().admit(new_booking(lot.id, 1, 1, 2)).await.unwrap();

        // owner confirms between the caller's read and the reschedule
        provider
            .bookings()
            .transition_status(
                b.id,
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                TransitionStamps::default(),
            )
            .await
            .unwrap();

        let start = Utc::now() + Duration::hours(10);
        let err = provider
            .bookings()
            .reschedule(
                b.id,
                WindowChange {
                    start_time: start,
                    end_time: start + Duration::hours(4),
                    duration_minutes: 240,
                    total_price_cents: 400,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotMutable(_)));

        // the confirmed booking kept its window and frozen price
        let unchanged = provider.bookings().find_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(unchanged.start_time, b.start_time);
        assert_eq!(unchanged.end_time, b.end_time);
        assert_eq!(unchanged.total_price_cents, b.total_price_cents);
    }

    #[tokio::test]
    async fn pagination_splits_driver_bookings() {
        let provider = MemoryRepositoryProvider::new();
        let lot = lot_with_spaces(&provider, 10).await;
        for i in 0..5 {
            provider
                .bookings()
                .admit(new_booking(lot.id, 1, 1 + i * 3, 2))
                .await
                .unwrap();
        }

        let page = provider
            .bookings()
            .list_for_driver(1, None, PaginationParams { page: 2, limit: 2 })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages, 3);
    }
}
