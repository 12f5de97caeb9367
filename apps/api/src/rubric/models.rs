use serde::{Deserialize, Serialize};

/// Hiring requirements for one job title. Fields the model leaves out
/// default to empty lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RubricDocument {
    pub must_have: Vec<String>,
    pub optional: Vec<String>,
    pub experience: Vec<String>,
    pub notes: Vec<String>,
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
pub fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Turns a job title into a document-name fragment:
/// `"Lecturer - CS"` becomes `"Lecturer_CS"`.
pub fn sanitize_job_title(title: &str) -> String {
    safe_filename(&title.trim().replace(" - ", "_").replace(' ', "_"))
}

/// `{label}_{title}` with both parts made filesystem-safe.
pub fn document_name(label: &str, job_title: &str) -> String {
    format!(
        "{}_{}",
        safe_filename(label.trim()),
        sanitize_job_title(job_title)
    )
}
