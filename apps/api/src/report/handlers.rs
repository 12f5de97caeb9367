use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tokio_util::io::ReaderStream;

use crate::errors::AppError;
use crate::report::{is_safe_report_name, XLSX_MIME};
use crate::state::AppState;

/// GET /resume/download-report/:filename
///
/// Streams a previously written report as an attachment. Unknown or unsafe
/// names are a 404, never a server error.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let not_found = || AppError::NotFound("File not found".to_string());

    if !is_safe_report_name(&filename) {
        return Err(not_found());
    }
    let path = state.storage.reports_dir().join(&filename);

    let length = match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => return Err(not_found()),
    };
    let file = tokio::fs::File::open(&path).await.map_err(|_| not_found())?;
    let body = Body::from_stream(ReaderStream::new(file));

    let disposition = format!(
        "attachment; filename=\"{}\"",
        filename.replace('"', "")
    );
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, length.to_string()),
        ],
        body,
    ))
}
