//! WebSocket interface

pub mod live;

pub use live::{create_live_state, ws_live_handler, LiveFilter, LiveState};
