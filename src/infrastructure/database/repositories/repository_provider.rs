//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::booking::BookingRepository;
use crate::domain::lot::LotRepository;
use crate::domain::notification::NotificationRepository;
use crate::domain::RepositoryProvider;

use super::booking_repository::SeaOrmBookingRepository;
use super::lot_repository::SeaOrmLotRepository;
use super::notification_repository::SeaOrmNotificationRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let lot = repos.lots().find_by_id(1).await?;
/// let booking = repos.bookings().find_by_id(42).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    lots: SeaOrmLotRepository,
    bookings: SeaOrmBookingRepository,
    notifications: SeaOrmNotificationRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            lots: SeaOrmLotRepository::new(db.clone()),
            bookings: SeaOrmBookingRepository::new(db.clone()),
            notifications: SeaOrmNotificationRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
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
