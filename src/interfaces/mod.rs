//! Interface layer: HTTP REST API and WebSocket live updates.

pub mod http;
pub mod ws;
