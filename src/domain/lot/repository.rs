//! Lot repository interface

use async_trait::async_trait;

use super::model::{CapacityAuditEntry, Lot};
use crate::domain::DomainResult;

/// Input for lot creation. Available spaces start equal to total.
#[derive(Debug, Clone)]
pub struct NewLot {
    pub owner_id: i32,
    pub name: String,
    pub address: String,
    pub total_spaces: i32,
    pub price_per_hour_cents: i64,
}

/// Owner-editable fields. `total_spaces` is deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct LotChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub price_per_hour_cents: Option<i64>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait LotRepository: Send + Sync {
    async fn insert(&self, lot: NewLot) -> DomainResult<Lot>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Lot>>;

    async fn find_by_owner(&self, owner_id: i32) -> DomainResult<Vec<Lot>>;

    async fn find_all_active(&self) -> DomainResult<Vec<Lot>>;

    async fn update(&self, id: i32, changes: LotChanges) -> DomainResult<Lot>;

    /// Set `available_spaces` and append the audit entry in one atomic
    /// unit. Implementations must re-check `0 <= new <= total` against
    /// the row they are updating, inside the same transaction.
    async fn set_available_spaces(
        &self,
        lot_id: i32,
        new_available: i32,
    ) -> DomainResult<(Lot, CapacityAuditEntry)>;

    /// Audit trail for a lot, newest first.
    async fn capacity_history(
        &self,
        lot_id: i32,
        limit: u64,
    ) -> DomainResult<Vec<CapacityAuditEntry>>;

    async fn delete(&self, id: i32) -> DomainResult<()>;
}
