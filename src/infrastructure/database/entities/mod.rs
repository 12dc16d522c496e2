//! SeaORM entity definitions

pub mod booking;
pub mod capacity_audit;
pub mod lot;
pub mod notification;
