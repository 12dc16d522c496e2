//! Live-update events
//!
//! Defines the event types broadcast to WebSocket clients: per-user
//! notification deliveries and per-lot capacity changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::notification::{Notification, NotificationKind};

/// Event types for live updates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A notification was persisted for a user; best-effort real-time copy.
    NotificationCreated(NotificationCreatedEvent),
    /// A lot's available-space count changed (owner update or walk-up).
    /// Fire-and-forget: subscribers reconcile by re-fetching on reconnect.
    LotSpacesChanged(LotSpacesChangedEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::NotificationCreated(_) => "notification",
            Event::LotSpacesChanged(_) => "lot_spaces_changed",
        }
    }

    /// The user this event is addressed to, if it is user-scoped.
    pub fn recipient_id(&self) -> Option<i32> {
        match self {
            Event::NotificationCreated(e) => Some(e.user_id),
            Event::LotSpacesChanged(_) => None,
        }
    }

    /// The lot this event concerns, if it is lot-scoped.
    pub fn lot_id(&self) -> Option<i32> {
        match self {
            Event::NotificationCreated(_) => None,
            Event::LotSpacesChanged(e) => Some(e.lot_id),
        }
    }
}

/// Notification created event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationCreatedEvent {
    pub notification_id: String,
    pub user_id: i32,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationCreatedEvent {
    fn from(n: &Notification) -> Self {
        Self {
            notification_id: n.id.clone(),
            user_id: n.user_id,
            kind: n.kind,
            title: n.title.clone(),
            message: n.message.clone(),
            payload: n.payload.clone(),
            created_at: n.created_at,
        }
    }
}

/// Lot spaces changed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotSpacesChangedEvent {
    pub lot_id: i32,
    pub available_spaces: i32,
    pub total_spaces: i32,
    pub timestamp: DateTime<Utc>,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
