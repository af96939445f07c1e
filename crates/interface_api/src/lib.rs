//! HTTP API Layer
//!
//! REST and realtime interface for the claims platform, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: request handlers per domain area (auth, accidents,
//!   traffic, claims, notifications, admin)
//! - **Middleware**: JWT authentication, role guards, audit logging, and the
//!   response cache
//! - **DTOs**: request/response data transfer objects
//! - **ws**: the WebSocket endpoint feeding per-user and per-claim rooms
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(pool, config, cache, predictor);
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod auth;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod ws;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_accidents::DamagePredictor;
use domain_notifications::{NotificationService, NotificationStore};
use domain_users::UserPort;
use infra_cache::ResponseCache;
use infra_db::{AccidentRepository, ClaimsRepository, NotificationRepository, UserRepository};
use infra_realtime::RealtimeHub;

use crate::config::ApiConfig;
use crate::handlers::{accidents, admin, auth as auth_handlers, claims, health, notifications, traffic};
use crate::middleware::{
    audit_middleware, auth_middleware, cache_middleware, require_admin, require_agent,
    require_traffic,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserPort>,
    pub claims: ClaimsRepository,
    pub reports: AccidentRepository,
    pub notifier: Arc<NotificationService>,
    pub inbox: Arc<dyn NotificationStore>,
    pub predictor: Arc<dyn DamagePredictor>,
    pub hub: Arc<RealtimeHub>,
    pub cache: Arc<ResponseCache>,
    pub http: reqwest::Client,
    pub pool: PgPool,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires repositories, the notification fan-out, and the realtime hub
    /// onto a connection pool
    pub fn new(
        pool: PgPool,
        config: ApiConfig,
        cache: Arc<ResponseCache>,
        predictor: Arc<dyn DamagePredictor>,
    ) -> Self {
        let hub = Arc::new(RealtimeHub::new());
        let inbox: Arc<dyn NotificationStore> =
            Arc::new(NotificationRepository::new(pool.clone()));
        let notifier = Arc::new(NotificationService::new(inbox.clone(), hub.clone()));

        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            claims: ClaimsRepository::new(pool.clone()),
            reports: AccidentRepository::new(pool.clone()),
            notifier,
            inbox,
            predictor,
            hub,
            cache,
            http: reqwest::Client::new(),
            pool,
            config,
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/ws", get(ws::websocket_handler));

    // Registration issues the first token, so it sits outside the auth layer
    let auth_public = Router::new().route("/auth/register", post(auth_handlers::register));

    // Accident routes (drivers)
    let accident_routes = Router::new()
        .route("/", post(accidents::submit_report))
        .route("/", get(accidents::my_reports));

    // Cached traffic listings share one invalidation prefix
    let traffic_cached = Router::new()
        .route("/reports", get(traffic::list_reports))
        .route("/reports/pending", get(traffic::list_pending_reports))
        .route_layer(axum_middleware::from_fn_with_state(
            (state.clone(), traffic::CACHE_PREFIX),
            cache_middleware,
        ));
    let traffic_routes = Router::new()
        .merge(traffic_cached)
        .route("/reports/:id", get(traffic::get_report))
        .route("/reports/:id/verify", post(traffic::verify_report))
        .route_layer(axum_middleware::from_fn(require_traffic));

    // Claims routes
    let claims_core = Router::new()
        .route("/", post(claims::create_claim))
        .route("/", get(claims::list_claims))
        .route("/:id", get(claims::get_claim))
        .route("/:id/chat", post(claims::send_chat_message));
    let claims_agent = Router::new()
        .route("/:id/status", put(claims::update_status))
        .route("/:id/settle", post(claims::settle_claim))
        .route_layer(axum_middleware::from_fn(require_agent));
    let claims_admin = Router::new()
        .route("/:id/assign", post(claims::assign_claim))
        .route("/:id/reassign", post(claims::reassign_claim))
        .route_layer(axum_middleware::from_fn(require_admin));
    let claims_routes = claims_core.merge(claims_agent).merge(claims_admin);

    // Notification inbox routes
    let notification_admin = Router::new()
        .route("/broadcast", post(notifications::send_broadcast))
        .route_layer(axum_middleware::from_fn(require_admin));
    let notification_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/unread-count", get(notifications::unread_count))
        .route("/:id/read", put(notifications::mark_as_read))
        .route("/mark-all-read", put(notifications::mark_all_as_read))
        .route("/:id", delete(notifications::delete_notification))
        .route("/read/all", delete(notifications::delete_all_read))
        .route("/test", post(notifications::test_notification))
        .merge(notification_admin);

    // Admin routes
    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/:id/role", put(admin::update_user_role))
        .route("/analytics/summary", get(admin::analytics_summary))
        .route("/export/claims.csv", get(admin::export_claims_csv))
        .route("/export/accidents.csv", get(admin::export_accidents_csv))
        .route_layer(axum_middleware::from_fn(require_admin));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/accidents", accident_routes)
        .nest("/traffic", traffic_routes)
        .nest("/claims", claims_routes)
        .nest("/notifications", notification_routes)
        .nest("/admin", admin_routes)
        .route("/auth/profile", get(auth_handlers::profile))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes.merge(auth_public))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
