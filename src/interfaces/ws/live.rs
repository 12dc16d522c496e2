//! WebSocket handler for live-update clients
//!
//! Streams notification and capacity events to connected clients.
//! Delivery here is best-effort: notifications are already persisted
//! before they reach the bus, so a dropped socket loses nothing.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::select;
use tracing::{debug, error, info, warn};

use crate::application::events::{EventMessage, SharedEventBus};
use crate::application::session::SharedConnectionRegistry;

/// Query parameters for filtering events
#[derive(Debug, Deserialize)]
pub struct LiveFilter {
    /// Receive notifications addressed to this user (optional)
    pub user_id: Option<i32>,
    /// Filter capacity events by lot IDs (comma-separated, optional)
    pub lot_ids: Option<String>,
}

impl LiveFilter {
    /// Check if event matches the filter.
    ///
    /// User-scoped events are only delivered to the addressed user.
    /// Lot-scoped events go to everyone unless a lot filter is set.
    pub fn matches(&self, event: &EventMessage) -> bool {
        if let Some(recipient) = event.event.recipient_id() {
            return self.user_id == Some(recipient);
        }

        if let Some(lot_id) = event.event.lot_id() {
            if let Some(ref ids) = self.lot_ids {
                return ids
                    .split(',')
                    .filter_map(|s| s.trim().parse::<i32>().ok())
                    .any(|id| id == lot_id);
            }
        }

        true
    }
}

/// State for the live-update WebSocket handler
#[derive(Clone)]
pub struct LiveState {
    pub event_bus: SharedEventBus,
    pub registry: SharedConnectionRegistry,
}

/// WebSocket upgrade handler for live updates
pub async fn ws_live_handler(
    ws: WebSocketUpgrade,
    State(state): State<LiveState>,
    Query(filter): Query<LiveFilter>,
) -> impl IntoResponse {
    info!(
        "New live WebSocket connection: user={:?}, lots={:?}",
        filter.user_id, filter.lot_ids
    );

    ws.on_upgrade(move |socket| handle_live_socket(socket, state, filter))
}

/// Handle a WebSocket connection for live updates
async fn handle_live_socket(socket: WebSocket, state: LiveState, filter: LiveFilter) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscriber = state.event_bus.subscribe();

    if let Some(user_id) = filter.user_id {
        state.registry.register(user_id);
    }

    // Send welcome message
    let welcome = serde_json::json!({
        "type": "connected",
        "message": "Connected to live update stream",
        "filter": {
            "user_id": filter.user_id,
            "lot_ids": filter.lot_ids
        }
    });

    if let Err(e) = sender.send(Message::Text(welcome.to_string().into())).await {
        error!("Failed to send welcome message: {}", e);
        if let Some(user_id) = filter.user_id {
            state.registry.unregister(user_id);
        }
        return;
    }

    info!("Live WebSocket client connected");

    loop {
        select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Received text message: {}", text);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            error!("Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        debug!("Received pong");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client sent close");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!("WebSocket stream ended");
                        break;
                    }
                    _ => {}
                }
            }

            event = subscriber.recv() => {
                match event {
                    Some(event_msg) => {
                        if !filter.matches(&event_msg) {
                            continue;
                        }

                        match serde_json::to_string(&event_msg) {
                            Ok(json) => {
                                if let Err(e) = sender.send(Message::Text(json.into())).await {
                                    error!("Failed to send event: {}", e);
                                    break;
                                }
                                debug!("Event sent to client: {}", event_msg.event.event_type());
                            }
                            Err(e) => {
                                error!("Failed to serialize event: {}", e);
                            }
                        }
                    }
                    None => {
                        warn!("Event bus closed");
                        break;
                    }
                }
            }
        }
    }

    if let Some(user_id) = filter.user_id {
        state.registry.unregister(user_id);
    }
    info!("Live WebSocket client disconnected");
}

/// Create live-update state
pub fn create_live_state(
    event_bus: SharedEventBus,
    registry: SharedConnectionRegistry,
) -> LiveState {
    LiveState {
        event_bus,
        registry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::{Event, LotSpacesChangedEvent, NotificationCreatedEvent};
    use crate::domain::notification::NotificationKind;
    use chrono::Utc;

    fn notification_event(user_id: i32) -> EventMessage {
        EventMessage::new(Event::NotificationCreated(NotificationCreatedEvent {
            notification_id: "n-1".to_string(),
            user_id,
            kind: NotificationKind::BookingCreated,
            title: "t".to_string(),
            message: "m".to_string(),
            payload: None,
            created_at: Utc::now(),
        }))
    }

    fn capacity_event(lot_id: i32) -> EventMessage {
        EventMessage::new(Event::LotSpacesChanged(LotSpacesChangedEvent {
            lot_id,
            available_spaces: 3,
            total_spaces: 10,
            timestamp: Utc::now(),
        }))
    }

    #[test]
    fn notifications_only_reach_the_addressed_user() {
        let mine = LiveFilter {
            user_id: Some(7),
            lot_ids: None,
        };
        let theirs = LiveFilter {
            user_id: Some(8),
            lot_ids: None,
        };
        let anonymous = LiveFilter {
            user_id: None,
            lot_ids: None,
        };

        let event = notification_event(7);
        assert!(mine.matches(&event));
        assert!(!theirs.matches(&event));
        assert!(!anonymous.matches(&event));
    }

    #[test]
    fn capacity_events_respect_lot_filter() {
        let filtered = LiveFilter {
            user_id: None,
            lot_ids: Some("1, 2".to_string()),
        };
        let open = LiveFilter {
            user_id: None,
            lot_ids: None,
        };

        assert!(filtered.matches(&capacity_event(2)));
        assert!(!filtered.matches(&capacity_event(3)));
        assert!(open.matches(&capacity_event(3)));
    }
}
