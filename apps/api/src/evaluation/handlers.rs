use std::convert::Infallible;

use axum::{
    extract::{Multipart, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::{stream, Stream};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::info;

use crate::errors::AppError;
use crate::evaluation::evaluator::{EvaluationRun, Evaluator, EventSink, ResumeUpload};
use crate::rubric::catalog::RubricCatalog;
use crate::state::AppState;

const EVENT_BUFFER: usize = 32;

/// POST /resume/langchain-stream
///
/// Multipart form: `resumes` (repeated PDF files) and `rubric_names[]`.
/// Validation happens before the stream opens; after that every outcome,
/// including failures, arrives as an event on a 200 response.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let mut resumes: Vec<ResumeUpload> = Vec::new();
    let mut raw_names: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "resumes" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))?;
                // browsers send an empty, unnamed part when no file is chosen
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                resumes.push(ResumeUpload { filename, data });
            }
            "rubric_names[]" | "rubric_names" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))?;
                raw_names.push(value);
            }
            _ => {}
        }
    }

    let rubric_names = normalize_rubric_names(&raw_names);
    if rubric_names.is_empty() || resumes.is_empty() {
        return Err(AppError::Validation(
            "Rubric(s) and resumes required".to_string(),
        ));
    }

    let rubrics = RubricCatalog::new(state.storage.rubrics_dir())
        .load_set(&rubric_names)
        .await?;

    info!(
        resumes = resumes.len(),
        rubrics = rubrics.len(),
        "evaluation request accepted"
    );

    let evaluator = Evaluator::new(
        state.storage.clone(),
        state.llm.clone(),
        state.batching,
        state.report_retention,
    );
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    tokio::spawn(async move {
        evaluator
            .run(EvaluationRun { resumes, rubrics }, EventSink::new(tx))
            .await;
    });

    let events = stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|event| (Ok::<_, Infallible>(event.to_sse()), rx))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Flattens submitted rubric-name values. Each value may be a plain name, a
/// JSON string, or a JSON array of names. Blank names are dropped and
/// duplicates removed, keeping first occurrence order.
pub fn normalize_rubric_names(raw: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        let name = name.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };

    for value in raw {
        match serde_json::from_str::<Value>(value.trim()) {
            Ok(Value::String(s)) => push(s.as_str()),
            Ok(Value::Array(items)) => {
                for item in items {
                    if let Value::String(s) = item {
                        push(s.as_str());
                    }
                }
            }
            _ => push(value.as_str()),
        }
    }
    names
}
