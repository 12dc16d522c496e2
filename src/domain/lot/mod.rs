//! Lot aggregate: capacity store and audit trail

pub mod model;
pub mod repository;

pub use model::{CapacityAuditEntry, Lot};
pub use repository::{LotChanges, LotRepository, NewLot};
