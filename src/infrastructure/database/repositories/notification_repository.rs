//! SeaORM implementation of NotificationRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::domain::notification::{Notification, NotificationKind, NotificationRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::notification;

use super::db_err;

pub struct SeaOrmNotificationRepository {
    db: DatabaseConnection,
}

impl SeaOrmNotificationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: notification::Model) -> DomainResult<Notification> {
    let kind = NotificationKind::parse(&m.kind).ok_or_else(|| {
        DomainError::Storage(format!("notification {} has unknown kind {}", m.id, m.kind))
    })?;
    let payload = m
        .payload
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| DomainError::Storage(format!("notification payload: {}", e)))?;
    Ok(Notification {
        id: m.id,
        user_id: m.user_id,
        kind,
        title: m.title,
        message: m.message,
        payload,
        read: m.read,
        created_at: m.created_at,
    })
}

#[async_trait]
impl NotificationRepository for SeaOrmNotificationRepository {
    async fn insert(&self, n: Notification) -> DomainResult<()> {
        let payload = n
            .payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DomainError::Storage(format!("notification payload: {}", e)))?;

        let model = notification::ActiveModel {
            id: Set(n.id),
            user_id: Set(n.user_id),
            kind: Set(n.kind.as_str().to_string()),
            title: Set(n.title),
            message: Set(n.message),
            payload: Set(payload),
            read: Set(n.read),
            created_at: Set(n.created_at),
        };
        model.insert(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Notification>> {
        let model = notification::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn list_for_user(&self, user_id: i32, limit: u64) -> DomainResult<Vec<Notification>> {
        let models = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn mark_read(&self, id: &str) -> DomainResult<()> {
        let existing = notification::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::NotFound {
                entity: "Notification",
                field: "id",
                value: id.to_string(),
            })?;

        let mut active: notification::ActiveModel = existing.into();
        active.read = Set(true);
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }
}
