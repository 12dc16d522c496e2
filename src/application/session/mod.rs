//! Live-connection registry
//!
//! Tracks which users currently hold a live WebSocket connection, so the
//! notification fan-out can tell delivered-now from stored-for-later.
//! This replaces a global socket hub: the registry is owned by the
//! fan-out side and connections register/unregister themselves.

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

/// Registry of live user connections. A user may hold several
/// connections (multiple tabs/devices); the count tracks all of them.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<i32, usize>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedConnectionRegistry {
        Arc::new(Self::new())
    }

    /// Record one more live connection for `user_id`.
    pub fn register(&self, user_id: i32) {
        let mut entry = self.connections.entry(user_id).or_insert(0);
        *entry += 1;
        debug!("User {} registered, connections: {}", user_id, *entry);
    }

    /// Drop one live connection for `user_id`.
    pub fn unregister(&self, user_id: i32) {
        let remove = match self.connections.get_mut(&user_id) {
            Some(mut entry) => {
                *entry = entry.saturating_sub(1);
                *entry == 0
            }
            None => false,
        };
        if remove {
            self.connections.remove(&user_id);
        }
        debug!("User {} unregistered", user_id);
    }

    pub fn is_connected(&self, user_id: i32) -> bool {
        self.connections
            .get(&user_id)
            .map(|c| *c > 0)
            .unwrap_or(false)
    }

    /// Number of distinct connected users.
    pub fn connected_users(&self) -> usize {
        self.connections.len()
    }
}

pub type SharedConnectionRegistry = Arc<ConnectionRegistry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_unregister_roundtrip() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.is_connected(1));

        registry.register(1);
        assert!(registry.is_connected(1));
        assert_eq!(registry.connected_users(), 1);

        registry.unregister(1);
        assert!(!registry.is_connected(1));
        assert_eq!(registry.connected_users(), 0);
    }

    #[test]
    fn multiple_connections_per_user() {
        let registry = ConnectionRegistry::new();
        registry.register(1);
        registry.register(1);
        registry.unregister(1);
        // still one live tab
        assert!(registry.is_connected(1));
        registry.unregister(1);
        assert!(!registry.is_connected(1));
    }

    #[test]
    fn unregister_unknown_user_is_harmless() {
        let registry = ConnectionRegistry::new();
        registry.unregister(42);
        assert!(!registry.is_connected(42));
    }
}
