//! HTTP API Route Definitions

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, AppState};

/// Create the API router with all routes
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/jobs", post(handlers::create_job))
        .route("/jobs/:id", get(handlers::get_job))
        .route("/jobs/:id/status", get(handlers::get_job))
        .route("/jobs/:id/files", post(handlers::attach_file))
        .route("/archives/:file", get(handlers::download_archive))
        .route("/admin/cleanup", post(handlers::cleanup))
        .with_state(app_state)
}
