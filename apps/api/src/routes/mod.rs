pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidates
        .route("/api/v1/candidates", get(handlers::handle_list_candidates))
        .route("/api/v1/candidates/counts", get(handlers::handle_counts))
        .route(
            "/api/v1/candidates/:id/extract",
            post(handlers::handle_extract),
        )
        .route("/api/v1/candidates/:id/score", post(handlers::handle_score))
        .route(
            "/api/v1/candidates/:id/status",
            post(handlers::handle_transition),
        )
        .route(
            "/api/v1/candidates/:id/reopen",
            post(handlers::handle_reopen),
        )
        // Jobs
        .route("/api/v1/jobs/:job_id/score", post(handlers::handle_score_job))
        // Batch screening
        .route("/api/v1/screening/runs", post(handlers::handle_start_run))
        .route(
            "/api/v1/screening/runs/progress",
            get(handlers::handle_run_progress),
        )
        .with_state(state)
}
