//! Application services orchestrating the domain

pub mod lot;
pub mod notification;
pub mod payment;
pub mod reservation;

pub use lot::{CreateLotCommand, LotService};
pub use notification::NotificationService;
pub use payment::PaymentService;
pub use reservation::{CreateBookingCommand, ReservationService, UpdateBookingCommand};
