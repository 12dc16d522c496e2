//! Parking lot REST API handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::dto::{
    CapacityAuditResponse, CreateLotRequest, LotResponse, SpacesChangedResponse, UpdateLotRequest,
    UpdateSpacesRequest,
};
use crate::application::services::lot::CreateLotCommand;
use crate::domain::lot::LotChanges;
use crate::domain::DomainError;
use crate::interfaces::http::common::{
    decimal_to_cents, domain_error_response, ApiError, ApiResponse, ApiResult, ValidatedJson,
};
use crate::interfaces::http::identity::Identity;
use crate::interfaces::http::router::AppState;

fn bad_amount() -> ApiError {
    domain_error_response(DomainError::Validation(
        "price_per_hour is not a valid money amount".to_string(),
    ))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct HistoryQuery {
    /// Maximum number of entries to return (default 50).
    pub limit: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/lots",
    tag = "Lots",
    request_body = CreateLotRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<LotResponse>),
        (status = 403, description = "Caller is not an owner")
    )
)]
pub async fn create_lot(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(req): ValidatedJson<CreateLotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LotResponse>>), ApiError> {
    let price_per_hour_cents = decimal_to_cents(req.price_per_hour).ok_or_else(bad_amount)?;
    let lot = state
        .lots
        .create_lot(
            &identity.actor(),
            CreateLotCommand {
                name: req.name,
                address: req.address,
                total_spaces: req.total_spaces,
                price_per_hour_cents,
            },
        )
        .await
        .map_err(domain_error_response)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(lot.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots",
    tag = "Lots",
    responses(
        (status = 200, description = "Active lots", body = ApiResponse<Vec<LotResponse>>)
    )
)]
pub async fn list_lots(State(state): State<AppState>) -> ApiResult<Vec<LotResponse>> {
    let lots = state
        .lots
        .list_active()
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(
        lots.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/mine",
    tag = "Lots",
    responses(
        (status = 200, description = "Caller's lots", body = ApiResponse<Vec<LotResponse>>),
        (status = 403, description = "Caller is not an owner")
    )
)]
pub async fn list_my_lots(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Vec<LotResponse>> {
    let lots = state
        .lots
        .list_for_owner(&identity.actor())
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(
        lots.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/{id}",
    tag = "Lots",
    params(("id" = i32, Path, description = "Lot ID")),
    responses(
        (status = 200, description = "Lot details", body = ApiResponse<LotResponse>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_lot(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<LotResponse> {
    let lot = state.lots.get_lot(id).await.map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(lot.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/lots/{id}",
    tag = "Lots",
    params(("id" = i32, Path, description = "Lot ID")),
    request_body = UpdateLotRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<LotResponse>),
        (status = 403, description = "Lot belongs to another owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_lot(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<UpdateLotRequest>,
) -> ApiResult<LotResponse> {
    let price_per_hour_cents = match req.price_per_hour {
        Some(p) => Some(decimal_to_cents(p).ok_or_else(bad_amount)?),
        None => None,
    };
    let lot = state
        .lots
        .update_lot(
            &identity.actor(),
            id,
            LotChanges {
                name: req.name,
                address: req.address,
                price_per_hour_cents,
                is_active: req.is_active,
            },
        )
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(lot.into())))
}

#[utoipa::path(
    patch,
    path = "/api/v1/lots/{id}/spaces",
    tag = "Lots",
    params(("id" = i32, Path, description = "Lot ID")),
    request_body = UpdateSpacesRequest,
    responses(
        (status = 200, description = "Spaces updated, audit entry written", body = ApiResponse<SpacesChangedResponse>),
        (status = 400, description = "Out of bounds"),
        (status = 403, description = "Lot belongs to another owner")
    )
)]
pub async fn update_spaces(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<UpdateSpacesRequest>,
) -> ApiResult<SpacesChangedResponse> {
    let (lot, audit) = state
        .lots
        .set_available_spaces(&identity.actor(), id, req.available_spaces)
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(SpacesChangedResponse {
        lot: lot.into(),
        audit: audit.into(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/{id}/capacity-history",
    tag = "Lots",
    params(
        ("id" = i32, Path, description = "Lot ID"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Audit trail, newest first", body = ApiResponse<Vec<CapacityAuditResponse>>),
        (status = 403, description = "Lot belongs to another owner")
    )
)]
pub async fn capacity_history(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<CapacityAuditResponse>> {
    let entries = state
        .lots
        .capacity_history(&identity.actor(), id, query.limit.unwrap_or(50))
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(
        entries.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/lots/{id}",
    tag = "Lots",
    params(("id" = i32, Path, description = "Lot ID")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<String>),
        (status = 403, description = "Lot belongs to another owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_lot(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
) -> ApiResult<String> {
    state
        .lots
        .delete_lot(&identity.actor(), id)
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(format!("Lot {} deleted", id))))
}
