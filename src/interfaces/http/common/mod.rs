//! Common HTTP response types and error mapping

pub mod validated_json;

pub use validated_json::ValidatedJson;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Standard API response wrapper.
///
/// Every REST endpoint returns data in this envelope.
/// On success: `{"success": true, "data": {...}}`,
/// on failure: `{"success": false, "error": "description"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// `true` when the request succeeded
    pub success: bool,
    /// Payload, `null` on error
    pub data: Option<T>,
    /// Error description, `null` on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error half of every handler's return type.
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

/// Handler result: a wrapped payload, or a status + wrapped error.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Render an integer cent amount as a decimal money value.
pub fn cents_to_decimal(cents: i64) -> rust_decimal::Decimal {
    rust_decimal::Decimal::new(cents, 2)
}

/// Parse a decimal money value into integer cents (rounded half-up to
/// a cent). Returns `None` when the amount does not fit.
pub fn decimal_to_cents(amount: rust_decimal::Decimal) -> Option<i64> {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::RoundingStrategy;
    (amount * rust_decimal::Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Translate a domain rejection into the one HTTP status it maps to.
/// This is the single place the mapping lives; handlers never choose
/// status codes themselves.
pub fn domain_error_response(e: DomainError) -> ApiError {
    let status = match &e {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) | DomainError::NotMutable(_) => StatusCode::BAD_REQUEST,
        DomainError::CapacityExceeded { .. }
        | DomainError::IllegalTransition { .. }
        | DomainError::AlreadyPaid(_) => StatusCode::CONFLICT,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::error(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_conversions_round_trip() {
        assert_eq!(cents_to_decimal(600).to_string(), "6.00");
        assert_eq!(decimal_to_cents(cents_to_decimal(12345)), Some(12345));
        // sub-cent input rounds to the nearest cent
        let third = rust_decimal::Decimal::new(3333, 4); // 0.3333
        assert_eq!(decimal_to_cents(third), Some(33));
        // exact half-cents round away from zero, not to even
        let half = rust_decimal::Decimal::new(125, 3); // 0.125
        assert_eq!(decimal_to_cents(half), Some(13));
    }

    #[test]
    fn status_mapping_is_stable() {
        let cases: Vec<(DomainError, StatusCode)> = vec![
            (
                DomainError::NotFound {
                    entity: "Booking",
                    field: "id",
                    value: "1".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                DomainError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::CapacityExceeded { lot_id: 1 },
                StatusCode::CONFLICT,
            ),
            (
                DomainError::IllegalTransition {
                    from: "PENDING",
                    to: "ACTIVE",
                },
                StatusCode::CONFLICT,
            ),
            (DomainError::NotMutable(1), StatusCode::BAD_REQUEST),
            (
                DomainError::Forbidden("no".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (DomainError::AlreadyPaid(1), StatusCode::CONFLICT),
            (
                DomainError::GatewayUnavailable("down".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                DomainError::Storage("io".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let (status, body) = domain_error_response(err);
            assert_eq!(status, expected);
            assert!(!body.0.success);
        }
    }
}
