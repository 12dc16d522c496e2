//! Notification inbox handlers
//!
//! The inbox is strictly per-user: the identity headers decide whose
//! rows are visible, and only the recipient can mark a row read.

use axum::extract::{Path, Query, State};
use axum::Json;

use super::dto::{InboxQuery, NotificationResponse};
use crate::interfaces::http::common::{domain_error_response, ApiResponse, ApiResult};
use crate::interfaces::http::identity::Identity;
use crate::interfaces::http::router::AppState;

const DEFAULT_INBOX_LIMIT: u64 = 50;

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    params(InboxQuery),
    responses(
        (status = 200, description = "Caller's notifications, newest first", body = ApiResponse<Vec<NotificationResponse>>)
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<InboxQuery>,
) -> ApiResult<Vec<NotificationResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_INBOX_LIMIT);
    let notifications = state
        .notifications
        .list_for_user(identity.user_id, limit)
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(
        notifications.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    patch,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked read", body = ApiResponse<NotificationResponse>),
        (status = 403, description = "Notification belongs to another user"),
        (status = 404, description = "Not found")
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<NotificationResponse> {
    let notification = state
        .notifications
        .mark_read(&id, identity.user_id)
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(notification.into())))
}
