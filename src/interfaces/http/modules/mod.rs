//! HTTP API modules, one per aggregate.

pub mod bookings;
pub mod health;
pub mod lots;
pub mod notifications;
pub mod payments;
