//! # ParkWise Booking Service
//!
//! Reservation and capacity engine for a parking space marketplace.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business entities, the booking state machine and
//!   repository traits
//! - **application**: Services (lots, reservations, payments,
//!   notifications), the event bus and outbound ports
//! - **infrastructure**: SeaORM persistence, in-memory storage and the
//!   sandbox payment gateway
//! - **interfaces**: REST API with Swagger documentation plus the live
//!   WebSocket stream
//! - **shared**: Error taxonomy, pagination and shutdown plumbing

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

// Re-export API router
pub use interfaces::http::{create_api_router, AppState};

// Re-export events
pub use application::{create_event_bus, Event, EventBus, SharedEventBus};
