//! Application layer: services, events, ports and live sessions

pub mod events;
pub mod ports;
pub mod services;
pub mod session;

pub use events::{create_event_bus, Event, EventBus, EventMessage, SharedEventBus};
pub use services::{LotService, NotificationService, PaymentService, ReservationService};
pub use session::{ConnectionRegistry, SharedConnectionRegistry};
