// Prompts for batch resume evaluation.

use serde::Serialize;

/// System prompt. Replace `{rubrics}` with the JSON-encoded rubric set.
pub const EVALUATION_SYSTEM_TEMPLATE: &str = r#"You are a strict and careful resume evaluator. Use the rubrics below to decide whether each resume in a batch meets the stated job requirements.

Rubrics:
{rubrics}

Each rubric contains:
- "must_have": mandatory qualifications (degree type, specialization, institution recognition)
- "optional": preferred but not required qualifications
- "experience": expected teaching or industry experience
- "notes": age limits, required registrations or certifications

Evaluate each resume against its relevant rubric and produce one object per resume:

{
  "filename": "<original filename>",
  "verdict": "Accepted" | "Rejected" | "Unclear",
  "reasons": ["State the reasoning behind the verdict, including missing, incomplete or ambiguous points."]
}

Verdict guidelines:
- Accepted: every "must_have" criterion is explicitly mentioned and matched. Closely matching
  field names are acceptable ("AI" = "Artificial Intelligence", "ML" = "Machine Learning") when
  the meaning is unambiguous.
- Unclear: a degree is mentioned without its division, HEC recognition or PEC registration is not
  stated, the specialization is vaguely worded, or required experience is only partially stated.
- Rejected: an important "must_have" criterion is clearly missing or contradicted, the degree level
  is below the requirement, or the resume states a disqualifying condition.

Format rules:
- Return a valid JSON array of these objects, one per resume, in the order the resumes are given.
- Use the filename exactly as provided.
- No markdown, no code blocks, no commentary.
"#;

/// User prompt. Replace `{resumes}` with the JSON-encoded batch.
pub const EVALUATION_USER_TEMPLATE: &str = "Evaluate the following batch of resumes:\n\n{resumes}";

/// One resume as it appears in the batch payload.
#[derive(Debug, Serialize)]
pub struct BatchEntry<'a> {
    pub filename: &'a str,
    pub resume: &'a str,
}

pub fn build_system_prompt(rubrics_json: &str) -> String {
    EVALUATION_SYSTEM_TEMPLATE.replace("{rubrics}", rubrics_json)
}

pub fn build_user_prompt(batch: &[BatchEntry<'_>]) -> String {
    let payload = serde_json::to_string(batch).unwrap_or_else(|_| "[]".to_string());
    EVALUATION_USER_TEMPLATE.replace("{resumes}", &payload)
}
