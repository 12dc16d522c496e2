//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    routing::{get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::events::{create_event_bus, SharedEventBus};
use crate::application::ports::PaymentGateway;
use crate::application::session::{ConnectionRegistry, SharedConnectionRegistry};
use crate::application::{LotService, NotificationService, PaymentService, ReservationService};
use crate::domain::RepositoryProvider;
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::modules::{bookings, health, lots, notifications, payments};
use crate::interfaces::ws::{create_live_state, ws_live_handler};
use crate::shared::types::pagination::{Page, PaginationParams};

/// Unified state for every HTTP route. Handlers borrow the service
/// they need; the registry and event bus are shared with the
/// WebSocket side.
#[derive(Clone)]
pub struct AppState {
    pub lots: Arc<LotService>,
    pub reservations: Arc<ReservationService>,
    pub payments: Arc<PaymentService>,
    pub notifications: Arc<NotificationService>,
    pub event_bus: SharedEventBus,
    pub registry: SharedConnectionRegistry,
    pub metrics: PrometheusHandle,
    /// Present when backed by SeaORM; `None` for in-memory storage.
    pub db: Option<DatabaseConnection>,
    pub started_at: Arc<Instant>,
}

impl AppState {
    /// Wire the full service graph on top of a repository provider.
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        gateway: Arc<dyn PaymentGateway>,
        currency: String,
        db: Option<DatabaseConnection>,
        metrics: PrometheusHandle,
    ) -> Self {
        let event_bus = create_event_bus();
        let registry = ConnectionRegistry::shared();

        let notifications = Arc::new(NotificationService::new(
            repos.clone(),
            event_bus.clone(),
            registry.clone(),
        ));
        let lots = Arc::new(LotService::new(repos.clone(), notifications.clone()));
        let reservations = Arc::new(ReservationService::new(repos.clone(), notifications.clone()));
        let payments = Arc::new(PaymentService::new(
            repos,
            notifications.clone(),
            gateway,
            currency,
        ));

        Self {
            lots,
            reservations,
            payments,
            notifications,
            event_bus,
            registry,
            metrics,
            db,
            started_at: Arc::new(Instant::now()),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Lots
        lots::create_lot,
        lots::list_lots,
        lots::list_my_lots,
        lots::get_lot,
        lots::update_lot,
        lots::update_spaces,
        lots::capacity_history,
        lots::delete_lot,
        // Bookings
        bookings::create_booking,
        bookings::list_bookings,
        bookings::get_booking,
        bookings::update_booking,
        bookings::update_status,
        bookings::delete_booking,
        // Payments
        payments::create_intent,
        payments::confirm_intent,
        payments::request_refund,
        payments::payment_history,
        // Notifications
        notifications::list_notifications,
        notifications::mark_read,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            PaginationParams,
            Page<bookings::BookingResponse>,
            // Lots
            lots::CreateLotRequest,
            lots::UpdateLotRequest,
            lots::UpdateSpacesRequest,
            lots::LotResponse,
            lots::CapacityAuditResponse,
            lots::SpacesChangedResponse,
            // Bookings
            bookings::CreateBookingRequest,
            bookings::UpdateBookingRequest,
            bookings::UpdateStatusRequest,
            bookings::BookingResponse,
            // Payments
            payments::CreateIntentRequest,
            payments::IntentResponse,
            payments::ConfirmIntentRequest,
            payments::RefundRequest,
            payments::RefundResponse,
            // Notifications
            notifications::NotificationResponse,
            // Health
            health::HealthResponse,
            health::ComponentHealth,
        )
    ),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Lots", description = "Parking lot management and capacity bookkeeping"),
        (name = "Bookings", description = "Booking admission and lifecycle management"),
        (name = "Payments", description = "Payment intents, confirmations and refunds"),
        (name = "Notifications", description = "Per-user notification inbox"),
        (name = "Live Updates", description = "Real-time notification and capacity events via WebSocket"),
    ),
    info(
        title = "ParkWise Booking API",
        version = "1.0.0",
        description = "REST API for parking space reservations",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let lot_routes = Router::new()
        .route("/", get(lots::list_lots).post(lots::create_lot))
        .route("/mine", get(lots::list_my_lots))
        .route(
            "/{id}",
            get(lots::get_lot)
                .put(lots::update_lot)
                .delete(lots::delete_lot),
        )
        .route("/{id}/spaces", patch(lots::update_spaces))
        .route("/{id}/capacity-history", get(lots::capacity_history));

    let booking_routes = Router::new()
        .route(
            "/",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/{id}",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .route("/{id}/status", patch(bookings::update_status));

    let payment_routes = Router::new()
        .route("/intent", post(payments::create_intent))
        .route("/confirm", post(payments::confirm_intent))
        .route("/refund", post(payments::request_refund))
        .route("/history", get(payments::payment_history));

    let notification_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/{id}/read", patch(notifications::mark_read));

    // Live WebSocket routes (no identity headers on the upgrade)
    let live_state = create_live_state(state.event_bus.clone(), state.registry.clone());
    let live_routes = Router::new()
        .route("/ws", get(ws_live_handler))
        .with_state(live_state);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health + metrics
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::render_metrics))
        // Aggregates
        .nest("/api/v1/lots", lot_routes)
        .nest("/api/v1/bookings", booking_routes)
        .nest("/api/v1/payments", payment_routes)
        .nest("/api/v1/notifications", notification_routes)
        .with_state(state)
        // Live WebSocket
        .nest("/api/v1/live", live_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{MemoryRepositoryProvider, SandboxPaymentGateway};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let repos = Arc::new(MemoryRepositoryProvider::new());
        let gateway = Arc::new(SandboxPaymentGateway::new());
        let metrics = PrometheusBuilder::new().build_recorder().handle();
        let state = AppState::new(repos, gateway, "usd".to_string(), None, metrics);
        create_api_router(state)
    }

    fn request(method: Method, uri: &str, user: Option<(i32, &str)>, body: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = user {
            builder = builder
                .header("x-user-id", id.to_string())
                .header("x-user-role", role);
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let router = test_router();
        let response = router
            .oneshot(request(Method::GET, "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"]["status"], "memory");
    }

    #[tokio::test]
    async fn missing_identity_headers_are_rejected() {
        let router = test_router();
        let response = router
            .oneshot(request(
                Method::POST,
                "/api/v1/lots",
                None,
                Some(r#"{"name":"Central","address":"1 Main St","total_spaces":10,"price_per_hour":2.5}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn lot_and_booking_flow_over_http() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/lots",
                Some((1, "owner")),
                Some(r#"{"name":"Central","address":"1 Main St","total_spaces":5,"price_per_hour":3.0}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let lot = body_json(response).await;
        let lot_id = lot["data"]["id"].as_i64().unwrap();
        assert_eq!(lot["data"]["available_spaces"], 5);

        let response = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/bookings",
                Some((2, "driver")),
                Some(&format!(
                    r#"{{"lot_id":{},"start_time":"2026-09-01T10:00:00Z","end_time":"2026-09-01T12:00:00Z"}}"#,
                    lot_id
                )),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let booking = body_json(response).await;
        assert_eq!(booking["success"], true);
        assert_eq!(booking["data"]["status"], "PENDING");
        // Decimal serializes as a string with cent precision.
        assert_eq!(booking["data"]["total_price"], "6.00");

        // Driver sees their booking in the list endpoint.
        let response = router
            .oneshot(request(
                Method::GET,
                "/api/v1/bookings",
                Some((2, "driver")),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_json(response).await;
        assert_eq!(page["data"]["total"], 1);
    }

    #[tokio::test]
    async fn driver_cannot_create_lots() {
        let router = test_router();
        let response = router
            .oneshot(request(
                Method::POST,
                "/api/v1/lots",
                Some((2, "driver")),
                Some(r#"{"name":"Central","address":"1 Main St","total_spaces":10,"price_per_hour":2.5}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let router = test_router();
        let response = router
            .oneshot(request(Method::GET, "/api-doc/openapi.json", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let doc = body_json(response).await;
        assert!(doc["paths"]["/api/v1/bookings"].is_object());
    }
}
