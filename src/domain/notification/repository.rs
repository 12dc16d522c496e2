//! Notification repository interface

use async_trait::async_trait;

use super::model::Notification;
use crate::domain::DomainResult;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: Notification) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Notification>>;

    /// Most recent notifications for a user, newest first.
    async fn list_for_user(&self, user_id: i32, limit: u64) -> DomainResult<Vec<Notification>>;

    /// Flip the read flag. Recipient checks happen in the service layer.
    async fn mark_read(&self, id: &str) -> DomainResult<()>;
}
