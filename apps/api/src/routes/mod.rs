pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::resumes::handlers as resumes;
use crate::state::AppState;
use crate::vacancies::handlers as vacancies;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resumes", post(resumes::handle_upload_resume))
        .route("/api/v1/resumes/:id", get(resumes::handle_get_resume))
        .route("/api/v1/vacancies", post(vacancies::handle_create_vacancy))
        .route("/api/v1/vacancies/:id", get(vacancies::handle_get_vacancy))
        .route("/api/v1/analyze", post(analysis::handle_analyze))
        .route("/api/v1/analyses/:id", get(analysis::handle_get_analysis))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
