//! Notification domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    BookingCreated,
    BookingConfirmed,
    BookingCancelled,
    BookingCompleted,
    PaymentProcessed,
    LotUpdated,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookingCreated => "BOOKING_CREATED",
            Self::BookingConfirmed => "BOOKING_CONFIRMED",
            Self::BookingCancelled => "BOOKING_CANCELLED",
            Self::BookingCompleted => "BOOKING_COMPLETED",
            Self::PaymentProcessed => "PAYMENT_PROCESSED",
            Self::LotUpdated => "LOT_UPDATED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BOOKING_CREATED" => Some(Self::BookingCreated),
            "BOOKING_CONFIRMED" => Some(Self::BookingConfirmed),
            "BOOKING_CANCELLED" => Some(Self::BookingCancelled),
            "BOOKING_COMPLETED" => Some(Self::BookingCompleted),
            "PAYMENT_PROCESSED" => Some(Self::PaymentProcessed),
            "LOT_UPDATED" => Some(Self::LotUpdated),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted notification. The row is the durable record; real-time
/// delivery is best-effort on top of it. Only the `read` flag ever
/// changes after creation, and only by the recipient.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: String,
    pub user_id: i32,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub payload: Option<serde_json::Value>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: i32,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            payload,
            read: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_notification_is_unread() {
        let n = Notification::new(1, NotificationKind::BookingCreated, "t", "m", None);
        assert!(!n.read);
        assert_eq!(n.user_id, 1);
        assert!(!n.id.is_empty());
    }

    #[test]
    fn kind_string_roundtrip() {
        for kind in [
            NotificationKind::BookingCreated,
            NotificationKind::BookingConfirmed,
            NotificationKind::BookingCancelled,
            NotificationKind::BookingCompleted,
            NotificationKind::PaymentProcessed,
            NotificationKind::LotUpdated,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("OTHER"), None);
    }
}
