//! Axum route handlers for rubric upload and listing.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;

use crate::errors::AppError;
use crate::rubric::catalog::RubricCatalog;
use crate::rubric::ingest::{ingest_rubric, IngestError, IngestResponse};
use crate::state::AppState;

/// POST /rubric/
///
/// Multipart form: `name` (batch label) and `rubric` (advertisement PDF).
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>, IngestError> {
    let mut name: Option<String> = None;
    let mut pdf: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| IngestError::InvalidForm(e.to_string()))?
    {
        match field.name().unwrap_or("") {
            "name" => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| IngestError::InvalidForm(e.to_string()))?,
                );
            }
            "rubric" => {
                pdf = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| IngestError::InvalidForm(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let (Some(name), Some(pdf)) = (name, pdf) else {
        return Err(IngestError::MissingInput);
    };

    let files = ingest_rubric(&state.storage, state.llm.as_ref(), &name, &pdf).await?;

    Ok(Json(IngestResponse {
        status: "Rubrics saved",
        files,
    }))
}

/// GET /rubric/list and GET /resume/rubrics
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let catalog = RubricCatalog::new(state.storage.rubrics_dir());
    let names = catalog.list_names().await.map_err(|e| {
        AppError::Storage(std::io::Error::new(
            e.kind(),
            format!("Failed to list rubrics: {e}"),
        ))
    })?;
    Ok(Json(names))
}
