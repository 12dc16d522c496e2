//! Booking DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::booking::Booking;
use crate::interfaces::http::common::cents_to_decimal;
use crate::shared::types::pagination::{Page, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    pub lot_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(length(max = 200))]
    pub vehicle_info: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBookingRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(length(max = 200))]
    pub vehicle_info: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Target status: CONFIRMED, ACTIVE, COMPLETED or CANCELLED.
    /// PAID and REFUNDED are driven by the payment gateway only.
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BookingListQuery {
    /// Filter by lifecycle status, e.g. `PENDING`.
    pub status: Option<String>,
    #[serde(flatten)]
    #[param(inline)]
    pub page: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingResponse {
    pub id: i32,
    pub driver_id: i32,
    pub lot_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    #[schema(value_type = f64)]
    pub total_price: Decimal,
    pub status: String,
    pub vehicle_info: Option<String>,
    pub notes: Option<String>,
    pub payment_completed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            driver_id: b.driver_id,
            lot_id: b.lot_id,
            start_time: b.start_time,
            end_time: b.end_time,
            duration_minutes: b.duration_minutes,
            total_price: cents_to_decimal(b.total_price_cents),
            status: b.status.as_str().to_string(),
            vehicle_info: b.vehicle_info,
            notes: b.notes,
            payment_completed_at: b.payment_completed_at,
            refunded_at: b.refunded_at,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

pub fn page_to_response(page: Page<Booking>) -> Page<BookingResponse> {
    page.map(Into::into)
}
