//! Caller identity extractor
//!
//! Authentication lives in the edge gateway in front of this service;
//! requests arrive with trusted `x-user-id` / `x-user-role` headers.
//! This extractor turns them into a typed [`Identity`] and rejects
//! requests where they are missing or malformed with 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;

use crate::domain::Actor;

use super::common::{ApiError, ApiResponse};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Driver,
    Owner,
}

/// The authenticated caller of an HTTP request.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: i32,
    pub role: Role,
}

impl Identity {
    pub fn actor(&self) -> Actor {
        match self.role {
            Role::Driver => Actor::Driver(self.user_id),
            Role::Owner => Actor::Owner(self.user_id),
        }
    }
}

fn unauthorized(message: &str) -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::error(message.to_string())),
    )
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i32>().ok())
            .ok_or_else(|| unauthorized("Missing or invalid x-user-id header"))?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());
        let role = match role.as_deref() {
            Some("driver") => Role::Driver,
            Some("owner") => Role::Owner,
            _ => return Err(unauthorized("Missing or invalid x-user-role header")),
        };

        Ok(Identity { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;

    async fn whoami(identity: Identity) -> String {
        format!("{}:{:?}", identity.user_id, identity.role)
    }

    async fn send(req: Request<Body>) -> axum::http::Response<Body> {
        use tower::ServiceExt;
        Router::new()
            .route("/whoami", get(whoami))
            .oneshot(req)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn valid_headers_extract_identity() {
        let req = Request::builder()
            .uri("/whoami")
            .header(USER_ID_HEADER, "42")
            .header(USER_ROLE_HEADER, "Driver")
            .body(Body::empty())
            .unwrap();
        let resp = send(req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_headers_are_unauthorized() {
        let req = Request::builder().uri("/whoami").body(Body::empty()).unwrap();
        let resp = send(req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_role_is_unauthorized() {
        let req = Request::builder()
            .uri("/whoami")
            .header(USER_ID_HEADER, "42")
            .header(USER_ROLE_HEADER, "admin")
            .body(Body::empty())
            .unwrap();
        let resp = send(req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
