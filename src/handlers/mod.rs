mod admin;
mod auth;
mod student;
mod system;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the full application router over the shared state.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Auth routes
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/verify", get(auth::verify_token))
        .route("/auth/logout", post(auth::logout))
        // Student routes
        .route("/student/dashboard", get(student::dashboard))
        .route("/student/submit", post(student::submit))
        .route("/student/history", get(student::history))
        .route("/student/job/:job_id", get(student::job_detail))
        // Admin routes
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/update-status", patch(admin::update_status))
        .route("/admin/analytics", get(admin::analytics))
        .route("/admin/jobs", get(admin::jobs));

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
