pub mod health;
pub mod pages;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::evaluation::handlers as evaluation;
use crate::report::handlers as report;
use crate::rubric::handlers as rubric;
use crate::state::AppState;

/// Resume batches and advertisement PDFs are well past axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(pages::index))
        .route("/health", get(health::health_handler))
        // Resume screening
        .route("/resume", get(pages::index))
        .route("/resume/", get(pages::index))
        .route("/resume/rubrics", get(rubric::handle_list))
        .route(
            "/resume/langchain-stream",
            post(evaluation::handle_evaluate),
        )
        .route(
            "/resume/download-report/:filename",
            get(report::handle_download),
        )
        // Rubric ingestion
        .route("/rubric", post(rubric::handle_upload))
        .route("/rubric/", post(rubric::handle_upload))
        .route("/rubric/list", get(rubric::handle_list))
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
