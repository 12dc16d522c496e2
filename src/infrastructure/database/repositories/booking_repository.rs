//! SeaORM implementation of BookingRepository
//!
//! The admission check (count overlapping occupying bookings against the
//! lot's available spaces) and the insert run in one transaction, at
//! serializable isolation on backends that support choosing one. SQLite
//! serializes writers by itself, so a plain transaction is enough there.

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};

use crate::domain::booking::{
    Booking, BookingRepository, BookingStatus, NewBooking, TransitionStamps, WindowChange,
    OCCUPYING_STATUSES,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{booking, lot};
use crate::shared::types::pagination::{Page, PaginationParams};

use super::db_err;

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn begin_admission(&self) -> DomainResult<DatabaseTransaction> {
        let txn = match self.db.get_database_backend() {
            // SQLite serializes writing transactions itself.
            DbBackend::Sqlite => self.db.begin().await,
            _ => {
                self.db
                    .begin_with_config(Some(IsolationLevel::Serializable), None)
                    .await
            }
        };
        txn.map_err(db_err)
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    let status = BookingStatus::parse(&m.status).ok_or_else(|| {
        DomainError::Storage(format!("booking {} has unknown status {}", m.id, m.status))
    })?;
    Ok(Booking {
        id: m.id,
        driver_id: m.driver_id,
        lot_id: m.lot_id,
        start_time: m.start_time,
        end_time: m.end_time,
        duration_minutes: m.duration_minutes,
        total_price_cents: m.total_price_cents,
        status,
        vehicle_info: m.vehicle_info,
        notes: m.notes,
        payment_intent_id: m.payment_intent_id,
        payment_completed_at: m.payment_completed_at,
        refunded_at: m.refunded_at,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn occupying_strs() -> Vec<&'static str> {
    OCCUPYING_STATUSES.iter().map(|s| s.as_str()).collect()
}

/// Count occupying bookings of `lot_id` overlapping `[start, end)`,
/// optionally excluding one booking (the one being rescheduled).
async fn count_overlaps<C: ConnectionTrait>(
    conn: &C,
    lot_id: i32,
    start: chrono::DateTime<Utc>,
    end: chrono::DateTime<Utc>,
    exclude: Option<i32>,
) -> DomainResult<u64> {
    let mut query = booking::Entity::find()
        .filter(booking::Column::LotId.eq(lot_id))
        .filter(booking::Column::Status.is_in(occupying_strs()))
        .filter(booking::Column::StartTime.lt(end))
        .filter(booking::Column::EndTime.gt(start));
    if let Some(id) = exclude {
        query = query.filter(booking::Column::Id.ne(id));
    }
    query.count(conn).await.map_err(db_err)
}

async fn load_lot_for_admission<C: ConnectionTrait>(
    conn: &C,
    lot_id: i32,
) -> DomainResult<lot::Model> {
    let lot = lot::Entity::find_by_id(lot_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(DomainError::NotFound {
            entity: "ParkingLot",
            field: "id",
            value: lot_id.to_string(),
        })?;
    if !lot.is_active {
        return Err(DomainError::Validation(
            "Parking lot is not active".to_string(),
        ));
    }
    Ok(lot)
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn admit(&self, b: NewBooking) -> DomainResult<Booking> {
        let txn = self.begin_admission().await?;

        let lot = load_lot_for_admission(&txn, b.lot_id).await?;
        let overlaps = count_overlaps(&txn, b.lot_id, b.start_time, b.end_time, None).await?;
        if overlaps >= lot.available_spaces.max(0) as u64 {
            return Err(DomainError::CapacityExceeded { lot_id: b.lot_id });
        }

        let now = Utc::now();
        let model = booking::ActiveModel {
            driver_id: Set(b.driver_id),
            lot_id: Set(b.lot_id),
            start_time: Set(b.start_time),
            end_time: Set(b.end_time),
            duration_minutes: Set(b.duration_minutes),
            total_price_cents: Set(b.total_price_cents),
            status: Set(BookingStatus::Pending.as_str().to_string()),
            vehicle_info: Set(b.vehicle_info),
            notes: Set(b.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let inserted = model.insert(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        debug!("Admitted booking {} for lot {}", inserted.id, b.lot_id);
        model_to_domain(inserted)
    }

    async fn reschedule(&self, booking_id: i32, change: WindowChange) -> DomainResult<Booking> {
        let txn = self.begin_admission().await?;

        let existing = booking::Entity::find_by_id(booking_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::NotFound {
                entity: "Booking",
                field: "id",
                value: booking_id.to_string(),
            })?;
        if existing.status != BookingStatus::Pending.as_str() {
            return Err(DomainError::NotMutable(booking_id));
        }

        let lot = load_lot_for_admission(&txn, existing.lot_id).await?;
        let overlaps = count_overlaps(
            &txn,
            existing.lot_id,
            change.start_time,
            change.end_time,
            Some(booking_id),
        )
        .await?;
        if overlaps >= lot.available_spaces.max(0) as u64 {
            return Err(DomainError::CapacityExceeded { lot_id: existing.lot_id });
        }

        // Conditional on the status so a transition committed since the
        // read above cannot be overwritten (same guard as
        // `transition_status`).
        let result = booking::Entity::update_many()
            .col_expr(
                booking::Column::StartTime,
                sea_orm::sea_query::Expr::value(change.start_time),
            )
            .col_expr(
                booking::Column::EndTime,
                sea_orm::sea_query::Expr::value(change.end_time),
            )
            .col_expr(
                booking::Column::DurationMinutes,
                sea_orm::sea_query::Expr::value(change.duration_minutes),
            )
            .col_expr(
                booking::Column::TotalPriceCents,
                sea_orm::sea_query::Expr::value(change.total_price_cents),
            )
            .col_expr(
                booking::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(booking::Column::Id.eq(booking_id))
            .filter(booking::Column::Status.eq(BookingStatus::Pending.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::NotMutable(booking_id));
        }

        let updated = booking::Entity::find_by_id(booking_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::NotFound {
                entity: "Booking",
                field: "id",
                value: booking_id.to_string(),
            })?;
        txn.commit().await.map_err(db_err)?;

        model_to_domain(updated)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Booking>> {
        let model = booking::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn transition_status(
        &self,
        id: i32,
        from: BookingStatus,
        to: BookingStatus,
        stamps: TransitionStamps,
    ) -> DomainResult<Booking> {
        let mut update = booking::Entity::update_many()
            .col_expr(
                booking::Column::Status,
                sea_orm::sea_query::Expr::value(to.as_str()),
            )
            .col_expr(
                booking::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(from.as_str()));
        if let Some(ts) = stamps.payment_completed_at {
            update = update.col_expr(
                booking::Column::PaymentCompletedAt,
                sea_orm::sea_query::Expr::value(ts),
            );
        }
        if let Some(ts) = stamps.refunded_at {
            update = update.col_expr(
                booking::Column::RefundedAt,
                sea_orm::sea_query::Expr::value(ts),
            );
        }

        let result = update.exec(&self.db).await.map_err(db_err)?;
        if result.rows_affected == 0 {
            // Lost a race with a concurrent transition (or the booking is gone).
            return Err(DomainError::IllegalTransition {
                from: from.as_str(),
                to: to.as_str(),
            });
        }

        let model = booking::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::NotFound {
                entity: "Booking",
                field: "id",
                value: id.to_string(),
            })?;
        model_to_domain(model)
    }

    async fn update_details(
        &self,
        id: i32,
        vehicle_info: Option<String>,
        notes: Option<String>,
    ) -> DomainResult<Booking> {
        let existing = booking::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::NotFound {
                entity: "Booking",
                field: "id",
                value: id.to_string(),
            })?;

        let mut active: booking::ActiveModel = existing.into();
        if let Some(v) = vehicle_info {
            active.vehicle_info = Set(Some(v));
        }
        if let Some(n) = notes {
            active.notes = Set(Some(n));
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await.map_err(db_err)?;
        model_to_domain(updated)
    }

    async fn set_payment_intent(&self, id: i32, intent_id: &str) -> DomainResult<Booking> {
        let existing = booking::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::NotFound {
                entity: "Booking",
                field: "id",
                value: id.to_string(),
            })?;

        let mut active: booking::ActiveModel = existing.into();
        active.payment_intent_id = Set(Some(intent_id.to_string()));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await.map_err(db_err)?;
        model_to_domain(updated)
    }

    async fn find_by_payment_intent(&self, intent_id: &str) -> DomainResult<Option<Booking>> {
        let model = booking::Entity::find()
            .filter(booking::Column::PaymentIntentId.eq(intent_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        booking::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_for_driver(
        &self,
        driver_id: i32,
        status: Option<BookingStatus>,
        page: PaginationParams,
    ) -> DomainResult<Page<Booking>> {
        let page = page.clamped();
        let mut query = booking::Entity::find().filter(booking::Column::DriverId.eq(driver_id));
        if let Some(s) = status {
            query = query.filter(booking::Column::Status.eq(s.as_str()));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let models = query
            .order_by_desc(booking::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items = models
            .into_iter()
            .map(model_to_domain)
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(Page::new(items, total, &page))
    }

    async fn list_for_owner(
        &self,
        owner_id: i32,
        status: Option<BookingStatus>,
        page: PaginationParams,
    ) -> DomainResult<Page<Booking>> {
        let page = page.clamped();
        let lot_ids = lot::Entity::find()
            .filter(lot::Column::OwnerId.eq(owner_id))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|l| l.id)
            .collect::<Vec<_>>();

        let mut query = booking::Entity::find().filter(booking::Column::LotId.is_in(lot_ids));
        if let Some(s) = status {
            query = query.filter(booking::Column::Status.eq(s.as_str()));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let models = query
            .order_by_desc(booking::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items = models
            .into_iter()
            .map(model_to_domain)
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(Page::new(items, total, &page))
    }

    async fn list_paid_for_driver(&self, driver_id: i32) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::DriverId.eq(driver_id))
            .filter(booking::Column::PaymentCompletedAt.is_not_null())
            .order_by_desc(booking::Column::PaymentCompletedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }
}
