// Prompt for turning advertisement text into per-title rubrics.

/// Replace `{advertisement_text}` before sending.
pub const RUBRIC_EXTRACTION_PROMPT: &str = r#"You are a highly precise assistant. Extract a detailed hiring rubric from the faculty advertisement text below.

Output a single valid JSON object that follows these rules:

Top-level keys are the exact job titles as written in the advertisement
(for example "Assistant Professor - School of Computing Sciences").

Each job title maps to an object with four lists of strings:

- "must_have": mandatory qualifications, written as structured phrases, e.g.
    "Degree: PhD or MS (First Division, 18 years of education) from an HEC recognized Institution"
    "Field of study must be one of: Artificial Intelligence, Data Science, Cyber Security"
- "optional": preferred but not mandatory qualifications, degrees, certifications or fields,
    each prefixed with "Preferred:" or "Recommended:".
- "experience": specific teaching or industry experience, e.g.
    "3 years university teaching experience in relevant field"
- "notes": any extra conditions, e.g. "Age limit: 40 years", "PEC registration required",
    "No 3rd Division allowed in academic record".

Extraction rules:
- Map degree names precisely; keep combinations such as "PhD or First Division MS" intact.
- List every specialization exactly as written; never shorten field names.
- If several job titles are grouped together, split them into separate keys.
- If the required experience depends on the degree level, list every alternative under "experience".
- Use an empty list when the advertisement says nothing for a field.

Return only the JSON object. Example of the expected shape:

{
  "Lecturer - Computing Sciences": {
    "must_have": [
      "Degree: MS (First Division, 18 years) from HEC recognized Institution",
      "Field of study must be one of: Cyber Security, Data Sciences"
    ],
    "optional": [],
    "experience": [],
    "notes": ["Age limit: 35 years"]
  }
}

Advertisement text:

{advertisement_text}
"#;

pub fn build_rubric_prompt(advertisement_text: &str) -> String {
    RUBRIC_EXTRACTION_PROMPT.replace("{advertisement_text}", advertisement_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_once() {
        let prompt = build_rubric_prompt("Lecturer wanted. MS required.");
        assert!(prompt.ends_with("Lecturer wanted. MS required.\n"));
        assert!(!prompt.contains("{advertisement_text}"));
    }
}
