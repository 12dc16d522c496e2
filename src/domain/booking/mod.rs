//! Booking aggregate: lifecycle state machine and repository interface

pub mod model;
pub mod repository;

pub use model::{
    duration_minutes, total_price_cents, validate_window, Actor, Booking, BookingStatus,
    OCCUPYING_STATUSES,
};
pub use repository::{
    BookingRepository, NewBooking, TransitionStamps, WindowChange,
};
