//! Parking lot management service
//!
//! Owner-facing CRUD plus the capacity bookkeeping path: every change to
//! a lot's advertised space count goes through [`LotService::set_available_spaces`],
//! which records an audit entry atomically with the update and then
//! broadcasts the new count to live subscribers.

use std::sync::Arc;

use log::{error, info};

use crate::domain::lot::{CapacityAuditEntry, Lot, LotChanges, NewLot};
use crate::domain::notification::NotificationKind;
use crate::domain::{Actor, DomainError, DomainResult, RepositoryProvider};

use super::notification::NotificationService;

/// Request to create a new parking lot. The lot opens with every space
/// available.
#[derive(Debug, Clone)]
pub struct CreateLotCommand {
    pub name: String,
    pub address: String,
    pub total_spaces: i32,
    pub price_per_hour_cents: i64,
}

/// Service for parking lot operations
pub struct LotService {
    repos: Arc<dyn RepositoryProvider>,
    notifier: Arc<NotificationService>,
}

impl LotService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, notifier: Arc<NotificationService>) -> Self {
        Self { repos, notifier }
    }

    fn owner_id(actor: &Actor) -> DomainResult<i32> {
        match actor {
            Actor::Owner(id) => Ok(*id),
            _ => Err(DomainError::Forbidden(
                "only lot owners may perform this operation".to_string(),
            )),
        }
    }

    async fn owned_lot(&self, actor: &Actor, lot_id: i32) -> DomainResult<Lot> {
        let owner_id = Self::owner_id(actor)?;
        let lot = self.find_lot(lot_id).await?;
        if !lot.is_owned_by(owner_id) {
            return Err(DomainError::Forbidden(
                "lot belongs to another owner".to_string(),
            ));
        }
        Ok(lot)
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

    pub async fn create_lot(&self, actor: &Actor, cmd: CreateLotCommand) -> DomainResult<Lot> {
        let owner_id = Self::owner_id(actor)?;
        if cmd.total_spaces <= 0 {
            return Err(DomainError::Validation(
                "total_spaces must be positive".to_string(),
            ));
        }
        if cmd.price_per_hour_cents < 0 {
            return Err(DomainError::Validation(
                "price_per_hour must not be negative".to_string(),
            ));
        }

        let lot = self
            .repos
            .lots()
            .insert(NewLot {
                owner_id,
                name: cmd.name,
                address: cmd.address,
                total_spaces: cmd.total_spaces,
                price_per_hour_cents: cmd.price_per_hour_cents,
            })
            .await?;

        info!("Owner {} created lot {} ({})", owner_id, lot.id, lot.name);
        Ok(lot)
    }

    pub async fn get_lot(&self, lot_id: i32) -> DomainResult<Lot> {
        self.find_lot(lot_id).await
    }

    /// Active lots, for drivers browsing where to book.
    pub async fn list_active(&self) -> DomainResult<Vec<Lot>> {
        self.repos.lots().find_all_active().await
    }

    pub async fn list_for_owner(&self, actor: &Actor) -> DomainResult<Vec<Lot>> {
        let owner_id = Self::owner_id(actor)?;
        self.repos.lots().find_by_owner(owner_id).await
    }

    /// Update lot details. A price change applies to future bookings
    /// only; existing bookings keep the total computed at creation.
    /// Leaves a durable notification on the owner's inbox as a record
    /// of the change.
    pub async fn update_lot(
        &self,
        actor: &Actor,
        lot_id: i32,
        changes: LotChanges,
    ) -> DomainResult<Lot> {
        self.owned_lot(actor, lot_id).await?;
        let updated = self.repos.lots().update(lot_id, changes).await?;

        let payload = serde_json::json!({
            "lotId": updated.id,
            "name": updated.name,
            "pricePerHour": updated.price_per_hour_cents,
            "isActive": updated.is_active,
        });
        if let Err(e) = self
            .notifier
            .notify(
                updated.owner_id,
                NotificationKind::LotUpdated,
                "Lot Updated",
                format!("Details of '{}' were updated", updated.name),
                Some(payload),
            )
            .await
        {
            error!("Failed to record update notification for lot {}: {}", lot_id, e);
        }

        Ok(updated)
    }

    /// Set the advertised available-space count. Writes the audit entry
    /// in the same transaction as the update, then broadcasts the new
    /// count.
    pub async fn set_available_spaces(
        &self,
        actor: &Actor,
        lot_id: i32,
        new_available: i32,
    ) -> DomainResult<(Lot, CapacityAuditEntry)> {
        let lot = self.owned_lot(actor, lot_id).await?;
        lot.check_available(new_available)?;

        let (updated, audit) = self
            .repos
            .lots()
            .set_available_spaces(lot_id, new_available)
            .await?;

        info!(
            "Lot {} spaces changed: {} -> {}",
            lot_id, audit.previous_spaces, audit.new_spaces
        );
        self.notifier
            .broadcast_capacity_change(lot_id, updated.available_spaces, updated.total_spaces);

        Ok((updated, audit))
    }

    /// Audit trail of manual space changes, newest first.
    pub async fn capacity_history(
        &self,
        actor: &Actor,
        lot_id: i32,
        limit: u64,
    ) -> DomainResult<Vec<CapacityAuditEntry>> {
        self.owned_lot(actor, lot_id).await?;
        self.repos.lots().capacity_history(lot_id, limit).await
    }

    pub async fn delete_lot(&self, actor: &Actor, lot_id: i32) -> DomainResult<()> {
        self.owned_lot(actor, lot_id).await?;
        self.repos.lots().delete(lot_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::session::ConnectionRegistry;
    use crate::infrastructure::storage::memory::MemoryRepositoryProvider;

    fn service() -> (LotService, Arc<NotificationService>) {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(MemoryRepositoryProvider::new());
        let notifier = Arc::new(NotificationService::new(
            repos.clone(),
            create_event_bus(),
            ConnectionRegistry::shared(),
        ));
        (LotService::new(repos, notifier.clone()), notifier)
    }

    fn cmd() -> CreateLotCommand {
        CreateLotCommand {
            name: "Downtown Garage".to_string(),
            address: "1 Main St".to_string(),
            total_spaces: 10,
            price_per_hour_cents: 500,
        }
    }

    #[tokio::test]
    async fn create_opens_with_all_spaces_available() {
        let (svc, _) = service();
        let lot = svc.create_lot(&Actor::Owner(1), cmd()).await.unwrap();
        assert_eq!(lot.available_spaces, 10);
        assert_eq!(lot.total_spaces, 10);
        assert!(lot.is_active);
    }

    #[tokio::test]
    async fn drivers_cannot_create_lots() {
        let (svc, _) = service();
        let err = svc.create_lot(&Actor::Driver(1), cmd()).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn spaces_change_writes_audit_entry() {
        let (svc, _) = service();
        let owner = Actor::Owner(1);
        let lot = svc.create_lot(&owner, cmd()).await.unwrap();

        let (updated, audit) = svc.set_available_spaces(&owner, lot.id, 4).await.unwrap();
        assert_eq!(updated.available_spaces, 4);
        assert_eq!(audit.previous_spaces, 10);
        assert_eq!(audit.new_spaces, 4);

        let history = svc.capacity_history(&owner, lot.id, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].new_spaces, 4);
    }

    #[tokio::test]
    async fn spaces_out_of_bounds_rejected() {
        let (svc, _) = service();
        let owner = Actor::Owner(1);
        let lot = svc.create_lot(&owner, cmd()).await.unwrap();

        assert!(matches!(
            svc.set_available_spaces(&owner, lot.id, -1).await.unwrap_err(),
            DomainError::Validation(_)
        ));
        assert!(matches!(
            svc.set_available_spaces(&owner, lot.id, 11).await.unwrap_err(),
            DomainError::Validation(_)
        ));
        // no audit entries from rejected attempts
        assert!(svc.capacity_history(&owner, lot.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_leaves_notification_for_owner() {
        let (svc, notifier) = service();
        let owner = Actor::Owner(1);
        let lot = svc.create_lot(&owner, cmd()).await.unwrap();

        let updated = svc
            .update_lot(
                &owner,
                lot.id,
                LotChanges {
                    price_per_hour_cents: Some(700),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_per_hour_cents, 700);

        let inbox = notifier.list_for_user(1, 10).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(
            inbox[0].kind,
            crate::domain::notification::NotificationKind::LotUpdated
        );
        assert_eq!(inbox[0].payload.as_ref().unwrap()["pricePerHour"], 700);
    }

    #[tokio::test]
    async fn other_owner_cannot_touch_lot() {
        let (svc, _) = service();
        let lot = svc.create_lot(&Actor::Owner(1), cmd()).await.unwrap();
        let err = svc
            .set_available_spaces(&Actor::Owner(2), lot.id, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
