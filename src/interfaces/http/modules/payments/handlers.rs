//! Payment REST API handlers
//!
//! `confirm` is the gateway's webhook: it authenticates with the intent
//! id it was handed at creation, not with user headers, and it is
//! idempotent under redelivery.

use axum::extract::State;
use axum::Json;

use super::dto::{
    ConfirmIntentRequest, CreateIntentRequest, IntentResponse, RefundRequest, RefundResponse,
};
use crate::interfaces::http::common::{
    domain_error_response, ApiResponse, ApiResult, ValidatedJson,
};
use crate::interfaces::http::identity::Identity;
use crate::interfaces::http::modules::bookings::BookingResponse;
use crate::interfaces::http::router::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/payments/intent",
    tag = "Payments",
    request_body = CreateIntentRequest,
    responses(
        (status = 200, description = "Intent created", body = ApiResponse<IntentResponse>),
        (status = 403, description = "Only the booking's driver may pay"),
        (status = 409, description = "Already paid, or booking not payable"),
        (status = 502, description = "Payment gateway unavailable")
    )
)]
pub async fn create_intent(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(req): ValidatedJson<CreateIntentRequest>,
) -> ApiResult<IntentResponse> {
    let intent = state
        .payments
        .create_intent(&identity.actor(), req.booking_id)
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(intent.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/confirm",
    tag = "Payments",
    request_body = ConfirmIntentRequest,
    responses(
        (status = 200, description = "Confirmation processed (no-op for unknown or already-paid intents)", body = ApiResponse<Option<BookingResponse>>)
    )
)]
pub async fn confirm_intent(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ConfirmIntentRequest>,
) -> ApiResult<Option<BookingResponse>> {
    let booking = state
        .payments
        .on_intent_succeeded(&req.intent_id)
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(booking.map(Into::into))))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/refund",
    tag = "Payments",
    request_body = RefundRequest,
    responses(
        (status = 200, description = "Refund acknowledged by the gateway", body = ApiResponse<RefundResponse>),
        (status = 403, description = "Caller may not refund this booking"),
        (status = 409, description = "Booking is not in a refundable state"),
        (status = 502, description = "Gateway unreachable; booking left untouched")
    )
)]
pub async fn request_refund(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(req): ValidatedJson<RefundRequest>,
) -> ApiResult<RefundResponse> {
    let reason = req.reason.as_deref().unwrap_or("requested_by_customer");
    let receipt = state
        .payments
        .request_refund(&identity.actor(), req.booking_id, reason)
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(receipt.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/history",
    tag = "Payments",
    responses(
        (status = 200, description = "Caller's paid bookings, most recent first", body = ApiResponse<Vec<BookingResponse>>),
        (status = 403, description = "Caller is not a driver")
    )
)]
pub async fn payment_history(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Vec<BookingResponse>> {
    let bookings = state
        .payments
        .payment_history(&identity.actor())
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(
        bookings.into_iter().map(Into::into).collect(),
    )))
}
