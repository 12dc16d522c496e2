//! SeaORM implementation of LotRepository
//!
//! `set_available_spaces` writes the lot update and its audit entry in
//! one transaction; a lot row never changes spaces without a matching
//! audit row.

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::domain::lot::{CapacityAuditEntry, Lot, LotChanges, LotRepository, NewLot};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{capacity_audit, lot};

use super::db_err;

pub struct SeaOrmLotRepository {
    db: DatabaseConnection,
}

impl SeaOrmLotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: lot::Model) -> Lot {
    Lot {
        id: m.id,
        owner_id: m.owner_id,
        name: m.name,
        address: m.address,
        total_spaces: m.total_spaces,
        available_spaces: m.available_spaces,
        price_per_hour_cents: m.price_per_hour_cents,
        is_active: m.is_active,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn audit_to_domain(m: capacity_audit::Model) -> CapacityAuditEntry {
    CapacityAuditEntry {
        id: m.id,
        lot_id: m.lot_id,
        previous_spaces: m.previous_spaces,
        new_spaces: m.new_spaces,
        created_at: m.created_at,
    }
}

fn not_found(id: i32) -> DomainError {
    DomainError::NotFound {
        entity: "ParkingLot",
        field: "id",
        value: id.to_string(),
    }
}

// ── LotRepository impl ──────────────────────────────────────────

#[async_trait]
impl LotRepository for SeaOrmLotRepository {
    async fn insert(&self, l: NewLot) -> DomainResult<Lot> {
        let now = Utc::now();
        let model = lot::ActiveModel {
            owner_id: Set(l.owner_id),
            name: Set(l.name),
            address: Set(l.address),
            total_spaces: Set(l.total_spaces),
            available_spaces: Set(l.total_spaces),
            price_per_hour_cents: Set(l.price_per_hour_cents),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        debug!("Created lot {}", inserted.id);
        Ok(model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Lot>> {
        let model = lot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_owner(&self, owner_id: i32) -> DomainResult<Vec<Lot>> {
        let models = lot::Entity::find()
            .filter(lot::Column::OwnerId.eq(owner_id))
            .order_by_desc(lot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_all_active(&self) -> DomainResult<Vec<Lot>> {
        let models = lot::Entity::find()
            .filter(lot::Column::IsActive.eq(true))
            .order_by_desc(lot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn update(&self, id: i32, changes: LotChanges) -> DomainResult<Lot> {
        let existing = lot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| not_found(id))?;

        let mut active: lot::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(address) = changes.address {
            active.address = Set(address);
        }
        if let Some(price) = changes.price_per_hour_cents {
            active.price_per_hour_cents = Set(price);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(updated))
    }

    async fn set_available_spaces(
        &self,
        lot_id: i32,
        new_available: i32,
    ) -> DomainResult<(Lot, CapacityAuditEntry)> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = lot::Entity::find_by_id(lot_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| not_found(lot_id))?;

        // Re-check the invariant against the row we are updating.
        let domain_lot = model_to_domain(existing.clone());
        domain_lot.check_available(new_available)?;

        let previous = existing.available_spaces;
        let mut active: lot::ActiveModel = existing.into();
        active.available_spaces = Set(new_available);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(db_err)?;

        let audit = capacity_audit::ActiveModel {
            lot_id: Set(lot_id),
            previous_spaces: Set(previous),
            new_spaces: Set(new_available),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let audit = audit.insert(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        debug!("Lot {} spaces {} -> {}", lot_id, previous, new_available);
        Ok((model_to_domain(updated), audit_to_domain(audit)))
    }

    async fn capacity_history(
        &self,
        lot_id: i32,
        limit: u64,
    ) -> DomainResult<Vec<CapacityAuditEntry>> {
        let models = capacity_audit::Entity::find()
            .filter(capacity_audit::Column::LotId.eq(lot_id))
            .order_by_desc(capacity_audit::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(audit_to_domain).collect())
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let result = lot::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
