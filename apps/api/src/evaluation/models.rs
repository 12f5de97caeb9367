use std::fmt;

use axum::response::sse::Event;
use serde::Serialize;
use serde_json::{json, Value};

/// Outcome for one resume against the selected rubrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Accepted,
    Rejected,
    Unclear,
}

impl Verdict {
    /// Case-insensitive; anything other than accepted/rejected is `Unclear`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "accepted" | "accept" => Verdict::Accepted,
            "rejected" | "reject" => Verdict::Rejected,
            _ => Verdict::Unclear,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accepted => "Accepted",
            Verdict::Rejected => "Rejected",
            Verdict::Unclear => "Unclear",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of the model's verdict array, read leniently: absent or
/// oddly-typed fields become `None` / empty rather than failing the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictEvent {
    pub filename: Option<String>,
    pub verdict: Option<Verdict>,
    pub reasons: Vec<String>,
}

impl VerdictEvent {
    pub fn from_model_value(value: &Value) -> Self {
        let filename = value
            .get("filename")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let verdict = value
            .get("verdict")
            .and_then(|v| v.as_str())
            .map(Verdict::parse_lenient);
        let reasons = match value.get("reasons") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
            _ => Vec::new(),
        };
        Self {
            filename,
            verdict,
            reasons,
        }
    }

    pub fn rejected(filename: &str, reason: &str) -> Self {
        Self {
            filename: Some(filename.to_string()),
            verdict: Some(Verdict::Rejected),
            reasons: vec![reason.to_string()],
        }
    }
}

/// Everything the evaluation stream can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationEvent {
    Started { filename: String },
    Failed { filename: String, error: String },
    Verdict(VerdictEvent),
    Report { download_link: String },
    /// The run finished but its report could not be written.
    ReportFailed { error: String },
    End,
}

impl EvaluationEvent {
    /// JSON body of the event's `data:` line. `End` has no JSON payload.
    pub fn payload(&self) -> Option<Value> {
        match self {
            EvaluationEvent::Started { filename } => {
                Some(json!({ "filename": filename, "status": "start" }))
            }
            EvaluationEvent::Failed { filename, error } => {
                Some(json!({ "filename": filename, "error": error }))
            }
            EvaluationEvent::Verdict(v) => serde_json::to_value(v).ok(),
            EvaluationEvent::Report { download_link } => {
                Some(json!({ "download_link": download_link }))
            }
            EvaluationEvent::ReportFailed { error } => Some(json!({ "error": error })),
            EvaluationEvent::End => None,
        }
    }

    pub fn to_sse(&self) -> Event {
        match self.payload() {
            Some(payload) => Event::default().data(payload.to_string()),
            None => Event::default().event("end").data("done"),
        }
    }
}

/// One spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub cv_name: String,
    pub verdict: String,
    pub reasons: String,
    pub rubric_name: String,
}

impl ReportRow {
    pub fn from_verdict(event: &VerdictEvent, rubric_name: &str) -> Self {
        Self {
            cv_name: event.filename.clone().unwrap_or_default(),
            verdict: event.verdict.map(|v| v.to_string()).unwrap_or_default(),
            reasons: event.reasons.join("\n"),
            rubric_name: rubric_name.to_string(),
        }
    }

    pub fn from_error(filename: &str, error: &str, rubric_name: &str) -> Self {
        Self {
            cv_name: filename.to_string(),
            verdict: "Error".to_string(),
            reasons: error.to_string(),
            rubric_name: rubric_name.to_string(),
        }
    }
}
