//! flyer-tours library - tour validation service
//!
//! Groups participations into tours, counts distinct participants per
//! IRIS sector, and commits tour statuses fifteen days before each tour
//! starts. Also serves the customer dashboard's projected statuses.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod engine;
pub mod error;
pub mod runner;
pub mod scheduler;
pub mod store;

use scheduler::ValidationService;
use store::SqliteStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Participation store
    pub store: Arc<SqliteStore>,
    /// Batch runner shared with the periodic scheduler
    pub validation: Arc<ValidationService>,
    /// Bearer secret for protected routes; `None` disables the check
    pub api_secret: Option<String>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        store: Arc<SqliteStore>,
        validation: Arc<ValidationService>,
        api_secret: Option<String>,
    ) -> Self {
        Self {
            store,
            validation,
            api_secret,
        }
    }
}

/// Build application router
///
/// Health and portal endpoints are public; triggering a batch and reading
/// batch history require the shared secret.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/api/validation/run", post(api::run_validation_batch))
        .route("/api/validation/history", get(api::get_validation_history))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/participations", post(api::create_participation))
        .route("/api/participations/:id", get(api::get_participation))
        .route(
            "/api/participations/:id/cancel",
            post(api::cancel_participation),
        )
        .route("/api/users/:user_id/dashboard", get(api::get_user_dashboard))
        .route("/api/tours", get(api::list_tours))
        .route("/api/cities", get(api::list_cities))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
