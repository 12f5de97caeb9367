//! Rubric ingestion: advertisement PDF in, one stored rubric document per job title out.
//!
//! Either every extracted document is written, or none is: all rubrics are
//! validated before the first write, and a failed write removes the documents
//! this request already wrote.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::extraction::json::excerpt;
use crate::extraction::{extract_json_object, extract_pdf_text, ExtractionError, JsonExtractError};
use crate::llm_client::{LanguageModel, LlmError};
use crate::rubric::catalog::RubricCatalog;
use crate::rubric::models::{document_name, safe_filename, RubricDocument};
use crate::rubric::prompts::build_rubric_prompt;
use crate::storage::Storage;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Name and file are required")]
    MissingInput,

    #[error("Invalid form data: {0}")]
    InvalidForm(String),

    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("No text could be extracted from the rubric PDF")]
    EmptyText,

    #[error("Groq API error: {0}")]
    Llm(#[from] LlmError),

    #[error("{source}")]
    Parse {
        source: JsonExtractError,
        excerpt: String,
    },

    #[error("Failed to parse rubric JSON: rubric for '{title}' is malformed: {source}")]
    MalformedRubric {
        title: String,
        source: serde_json::Error,
    },

    #[error("Model response contained no job titles")]
    NoJobTitles,

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestError::MissingInput
            | IngestError::InvalidForm(_)
            | IngestError::Extraction(_)
            | IngestError::EmptyText => StatusCode::BAD_REQUEST,
            IngestError::Llm(_) => StatusCode::BAD_GATEWAY,
            IngestError::Parse { .. }
            | IngestError::MalformedRubric { .. }
            | IngestError::NoJobTitles
            | IngestError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Rubric upload failures use the `{"status": message}` body shape.
impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Rubric ingestion failed: {self}");
        }
        let body = match &self {
            IngestError::Parse { excerpt, .. } => json!({
                "status": self.to_string(),
                "excerpt": excerpt,
            }),
            _ => json!({ "status": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub files: Vec<String>,
}

/// Runs the whole ingestion pipeline for one uploaded advertisement.
/// Returns the file names of the documents written.
pub async fn ingest_rubric(
    storage: &Storage,
    llm: &dyn LanguageModel,
    label: &str,
    pdf: &[u8],
) -> Result<Vec<String>, IngestError> {
    let label = label.trim();
    if label.is_empty() || pdf.is_empty() {
        return Err(IngestError::MissingInput);
    }

    let raw_path = storage
        .rubric_uploads_dir()
        .join(format!("{}_raw.pdf", safe_filename(label)));
    tokio::fs::write(&raw_path, pdf).await?;

    let text = extract_pdf_text(pdf.to_vec()).await?;
    if text.trim().is_empty() {
        return Err(IngestError::EmptyText);
    }

    let response = llm.complete(&build_rubric_prompt(&text)).await?;
    debug!(label, response = %response, "rubric model response");

    let documents = parse_rubric_response(label, &response)?;

    let catalog = RubricCatalog::new(storage.rubrics_dir());
    let files = catalog.write_all(&documents).await?;

    info!(label, count = files.len(), "rubrics saved");
    Ok(files)
}

/// Turns the model response into `(document name, rubric)` pairs without
/// touching the filesystem.
pub fn parse_rubric_response(
    label: &str,
    response: &str,
) -> Result<Vec<(String, RubricDocument)>, IngestError> {
    let object = extract_json_object(response).map_err(|source| {
        let excerpt = excerpt(response);
        warn!(error = %source, excerpt = %excerpt, "rubric response could not be parsed");
        IngestError::Parse { source, excerpt }
    })?;

    if object.is_empty() {
        return Err(IngestError::NoJobTitles);
    }

    let mut documents: Vec<(String, RubricDocument)> = Vec::with_capacity(object.len());
    for (title, value) in object {
        let doc = rubric_from_value(&title, value)?;
        let name = document_name(label, &title);
        // two titles that sanitise to the same name: the later one wins
        documents.retain(|(existing, _)| existing != &name);
        documents.push((name, doc));
    }
    Ok(documents)
}

fn rubric_from_value(title: &str, value: Value) -> Result<RubricDocument, IngestError> {
    serde_json::from_value(value).map_err(|source| IngestError::MalformedRubric {
        title: title.to_string(),
        source,
    })
}
