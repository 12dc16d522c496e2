pub mod booking;
pub mod lot;
pub mod notification;
pub mod repositories;

// Re-export commonly used types
pub use booking::{Actor, Booking, BookingStatus};
pub use lot::{CapacityAuditEntry, Lot};
pub use notification::{Notification, NotificationKind};
pub use repositories::{DomainResult, RepositoryProvider};

// Re-export DomainError from shared for convenience
pub use crate::shared::types::errors::DomainError;
