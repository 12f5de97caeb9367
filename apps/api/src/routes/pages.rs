use axum::{extract::State, response::Html};

use crate::errors::AppError;
use crate::state::AppState;

/// GET / and GET /resume/
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let path = state.static_dir.join("index.html");
    tokio::fs::read_to_string(&path)
        .await
        .map(Html)
        .map_err(|_| AppError::NotFound("Landing page not found".to_string()))
}
