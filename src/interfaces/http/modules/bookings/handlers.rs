//! Booking REST API handlers
//!
//! Handlers stay thin: parse, hand the typed command to the reservation
//! service, map the domain result. All authorization and lifecycle rules
//! live behind the service.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::dto::{
    page_to_response, BookingListQuery, BookingResponse, CreateBookingRequest,
    UpdateBookingRequest, UpdateStatusRequest,
};
use crate::application::services::reservation::{CreateBookingCommand, UpdateBookingCommand};
use crate::domain::booking::BookingStatus;
use crate::domain::DomainError;
use crate::interfaces::http::common::{
    domain_error_response, ApiError, ApiResponse, ApiResult, ValidatedJson,
};
use crate::interfaces::http::identity::{Identity, Role};
use crate::interfaces::http::router::AppState;
use crate::shared::types::pagination::Page;

fn parse_status_filter(raw: Option<&str>) -> Result<Option<BookingStatus>, ApiError> {
    match raw {
        None => Ok(None),
        Some(s) => BookingStatus::parse(&s.to_ascii_uppercase())
            .map(Some)
            .ok_or_else(|| {
                domain_error_response(DomainError::Validation(format!(
                    "Unknown booking status: {}",
                    s
                )))
            }),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking admitted", body = ApiResponse<BookingResponse>),
        (status = 400, description = "Invalid window or inactive lot"),
        (status = 403, description = "Caller is not a driver"),
        (status = 409, description = "Window is fully booked")
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingResponse>>), ApiError> {
    let booking = state
        .reservations
        .create_booking(
            &identity.actor(),
            CreateBookingCommand {
                lot_id: req.lot_id,
                start_time: req.start_time,
                end_time: req.end_time,
                vehicle_info: req.vehicle_info,
                notes: req.notes,
            },
        )
        .await
        .map_err(domain_error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(booking.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Caller's bookings (driver) or bookings across the caller's lots (owner)", body = ApiResponse<Page<BookingResponse>>)
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<BookingListQuery>,
) -> ApiResult<Page<BookingResponse>> {
    let status = parse_status_filter(query.status.as_deref())?;
    let actor = identity.actor();
    let page = match identity.role {
        Role::Driver => state
            .reservations
            .list_driver_bookings(&actor, status, query.page)
            .await,
        Role::Owner => state
            .reservations
            .list_owner_bookings(&actor, status, query.page)
            .await,
    }
    .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(page_to_response(page))))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details", body = ApiResponse<BookingResponse>),
        (status = 403, description = "Not visible to this user"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
) -> ApiResult<BookingResponse> {
    let booking = state
        .reservations
        .get_booking(&identity.actor(), id)
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(booking.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<BookingResponse>),
        (status = 400, description = "No longer editable"),
        (status = 403, description = "Booking belongs to another driver"),
        (status = 409, description = "New window is fully booked")
    )
)]
pub async fn update_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<UpdateBookingRequest>,
) -> ApiResult<BookingResponse> {
    let booking = state
        .reservations
        .update_booking(
            &identity.actor(),
            id,
            UpdateBookingCommand {
                start_time: req.start_time,
                end_time: req.end_time,
                vehicle_info: req.vehicle_info,
                notes: req.notes,
            },
        )
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(booking.into())))
}

#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}/status",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Transition applied", body = ApiResponse<BookingResponse>),
        (status = 403, description = "Actor may not drive this transition"),
        (status = 409, description = "Transition not legal from the current status")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<BookingResponse> {
    let target = BookingStatus::parse(&req.status.to_ascii_uppercase()).ok_or_else(|| {
        domain_error_response(DomainError::Validation(format!(
            "Unknown booking status: {}",
            req.status
        )))
    })?;

    let booking = state
        .reservations
        .transition(&identity.actor(), id, target)
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(booking.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<String>),
        (status = 400, description = "Only pending bookings can be deleted"),
        (status = 403, description = "Booking belongs to another driver")
    )
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
) -> ApiResult<String> {
    state
        .reservations
        .delete_booking(&identity.actor(), id)
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(format!("Booking {} deleted", id))))
}
