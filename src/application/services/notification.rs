//! Notification fan-out service
//!
//! Persists notifications (the durable record) and publishes best-effort
//! real-time copies on the event bus. Capacity broadcasts are
//! fire-and-forget and never persisted.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};

use crate::application::events::{
    Event, LotSpacesChangedEvent, NotificationCreatedEvent, SharedEventBus,
};
use crate::application::session::SharedConnectionRegistry;
use crate::domain::notification::{Notification, NotificationKind};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

/// Service for notification operations
pub struct NotificationService {
    repos: Arc<dyn RepositoryProvider>,
    event_bus: SharedEventBus,
    registry: SharedConnectionRegistry,
}

impl NotificationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        event_bus: SharedEventBus,
        registry: SharedConnectionRegistry,
    ) -> Self {
        Self {
            repos,
            event_bus,
            registry,
        }
    }

    /// Persist a notification for `user_id` and attempt real-time
    /// delivery. An offline recipient is not an error; the stored row
    /// remains retrievable later.
    pub async fn notify(
        &self,
        user_id: i32,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> DomainResult<Notification> {
        let notification = Notification::new(user_id, kind, title, message, payload);
        self.repos.notifications().insert(notification.clone()).await?;

        self.event_bus.publish(Event::NotificationCreated(
            NotificationCreatedEvent::from(&notification),
        ));
        metrics::counter!("parkwise_notifications_sent_total").increment(1);

        if self.registry.is_connected(user_id) {
            info!("Notification sent to user {}: {}", user_id, notification.title);
        } else {
            debug!(
                "User {} offline, notification {} stored for later",
                user_id, notification.id
            );
        }

        Ok(notification)
    }

    /// Push a lot's new space count to all live subscribers of that lot.
    /// At-most-once, no retry, nothing persisted; subscribers reconcile
    /// by re-fetching lot state on reconnect.
    pub fn broadcast_capacity_change(&self, lot_id: i32, available_spaces: i32, total_spaces: i32) {
        self.event_bus.publish(Event::LotSpacesChanged(LotSpacesChangedEvent {
            lot_id,
            available_spaces,
            total_spaces,
            timestamp: Utc::now(),
        }));
    }

    /// Most recent notifications for a user.
    pub async fn list_for_user(
        &self,
        user_id: i32,
        limit: u64,
    ) -> DomainResult<Vec<Notification>> {
        self.repos.notifications().list_for_user(user_id, limit).await
    }

    /// Flip the read flag; only the recipient may do so. Returns the
    /// updated notification.
    pub async fn mark_read(
        &self,
        notification_id: &str,
        requesting_user_id: i32,
    ) -> DomainResult<Notification> {
        let mut notification = self
            .repos
            .notifications()
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "Notification",
                field: "id",
                value: notification_id.to_string(),
            })?;

        if notification.user_id != requesting_user_id {
            return Err(DomainError::Forbidden(
                "notification belongs to another user".to_string(),
            ));
        }

        self.repos.notifications().mark_read(notification_id).await?;
        notification.read = true;
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::session::ConnectionRegistry;
    use crate::infrastructure::storage::memory::MemoryRepositoryProvider;

    fn service() -> (NotificationService, SharedEventBus) {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(MemoryRepositoryProvider::new());
        let bus = create_event_bus();
        let registry = ConnectionRegistry::shared();
        (
            NotificationService::new(repos, bus.clone(), registry),
            bus,
        )
    }

    #[tokio::test]
    async fn notify_persists_and_publishes() {
        let (svc, bus) = service();
        let mut sub = bus.subscribe();

        let n = svc
            .notify(7, NotificationKind::BookingCreated, "New Booking Request", "msg", None)
            .await
            .unwrap();

        let stored = svc.list_for_user(7, 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, n.id);
        assert!(!stored[0].read);

        let event = tokio::time::timeout(std::time::Duration::from_millis(100), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event.recipient_id(), Some(7));
    }

    #[tokio::test]
    async fn broadcast_is_not_persisted() {
        let (svc, bus) = service();
        let mut sub = bus.subscribe();

        svc.broadcast_capacity_change(3, 5, 10);

        let event = tokio::time::timeout(std::time::Duration::from_millis(100), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event.lot_id(), Some(3));
        // nothing stored for any user
        assert!(svc.list_for_user(3, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_read_enforces_recipient() {
        let (svc, _bus) = service();
        let n = svc
            .notify(7, NotificationKind::PaymentProcessed, "t", "m", None)
            .await
            .unwrap();

        let err = svc.mark_read(&n.id, 8).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        svc.mark_read(&n.id, 7).await.unwrap();
        let stored = svc.list_for_user(7, 10).await.unwrap();
        assert!(stored[0].read);
    }

    #[tokio::test]
    async fn mark_read_unknown_id_is_not_found() {
        let (svc, _bus) = service();
        let err = svc.mark_read("missing", 7).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
