use thiserror::Error;

/// Errors surfaced by the booking/capacity core.
///
/// Every variant maps to a stable, caller-distinguishable rejection
/// (the HTTP layer translates them to status codes); none of them is
/// retried inside the core.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    /// The requested window would exceed the lot's declared capacity.
    /// A business rejection, not a system fault.
    #[error("Lot {lot_id} is fully booked for the selected time slot")]
    CapacityExceeded { lot_id: i32 },

    #[error("Illegal transition: {from} -> {to}")]
    IllegalTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Booking fields can only be edited while the booking is pending.
    #[error("Booking {0} is no longer editable")]
    NotMutable(i32),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Booking {0} is already paid")]
    AlreadyPaid(i32),

    /// The payment gateway could not be reached. The core guarantees no
    /// partial state change for this variant, so the caller may retry.
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Whether this error is likely transient and the operation may
    /// succeed if retried by the caller.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DomainError::Storage(_) | DomainError::GatewayUnavailable(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}
