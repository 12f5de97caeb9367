//! Recovers JSON from free-form model output.
//!
//! Objects go through an ordered list of strategies, first success wins:
//! 1. the whole response parsed as-is
//! 2. the body of the first fenced code block
//! 3. the span from the first `{` to the last `}`
//!
//! Arrays are located by pattern search for `[ {` and read with a streaming
//! deserializer, so anything after the closing bracket is ignored.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

const EXCERPT_CHARS: usize = 500;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?i:json)?[ \t]*\r?\n?(.*?)```").unwrap());

static ARRAY_OPENING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\s*\{").unwrap());

#[derive(Debug, Error)]
pub enum JsonExtractError {
    #[error("No JSON object found in model response")]
    NotFound,

    #[error("Failed to parse rubric JSON ({strategy}): {source}")]
    Invalid {
        strategy: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model response JSON is not an object")]
    NotAnObject,
}

/// A pure extraction attempt: text in, parsed value or failure out.
pub struct Strategy {
    pub name: &'static str,
    pub run: fn(&str) -> Result<Value, JsonExtractError>,
}

pub const OBJECT_STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "direct",
        run: parse_direct,
    },
    Strategy {
        name: "fenced-block",
        run: parse_fenced_block,
    },
    Strategy {
        name: "brace-span",
        run: parse_brace_span,
    },
];

fn parse_as(strategy: &'static str, text: &str) -> Result<Value, JsonExtractError> {
    serde_json::from_str(text.trim()).map_err(|source| JsonExtractError::Invalid { strategy, source })
}

pub fn parse_direct(text: &str) -> Result<Value, JsonExtractError> {
    parse_as("direct", text)
}

pub fn parse_fenced_block(text: &str) -> Result<Value, JsonExtractError> {
    let body = FENCED_BLOCK
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or(JsonExtractError::NotFound)?;
    parse_as("fenced-block", body.as_str())
}

pub fn parse_brace_span(text: &str) -> Result<Value, JsonExtractError> {
    let start = text.find('{').ok_or(JsonExtractError::NotFound)?;
    let end = text.rfind('}').ok_or(JsonExtractError::NotFound)?;
    if end < start {
        return Err(JsonExtractError::NotFound);
    }
    parse_as("brace-span", &text[start..=end])
}

/// Runs the object strategies in order. When every strategy fails, the error
/// of the last strategy that located a candidate is returned; a failed direct
/// parse alone reads as "not found".
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, JsonExtractError> {
    let mut reported = JsonExtractError::NotFound;

    for (i, strategy) in OBJECT_STRATEGIES.iter().enumerate() {
        match (strategy.run)(text) {
            Ok(Value::Object(map)) => {
                debug!(strategy = strategy.name, keys = map.len(), "JSON object extracted");
                return Ok(map);
            }
            Ok(_) => {
                warn!(strategy = strategy.name, "JSON extracted but it is not an object");
                reported = JsonExtractError::NotAnObject;
            }
            Err(JsonExtractError::NotFound) => {
                warn!(strategy = strategy.name, "no JSON candidate located");
            }
            Err(e) => {
                warn!(strategy = strategy.name, error = %e, "JSON extraction strategy failed");
                if i > 0 {
                    reported = e;
                }
            }
        }
    }

    Err(reported)
}

/// Finds the first JSON array of objects embedded in `text`.
/// Returns `None` when no candidate parses.
pub fn extract_json_array(text: &str) -> Option<Vec<Value>> {
    for opening in ARRAY_OPENING.find_iter(text) {
        let mut values =
            serde_json::Deserializer::from_str(&text[opening.start()..]).into_iter::<Vec<Value>>();
        match values.next() {
            Some(Ok(array)) => return Some(array),
            Some(Err(e)) => debug!(offset = opening.start(), error = %e, "array candidate rejected"),
            None => {}
        }
    }
    None
}

/// A bounded prefix of a model response for error reports and logs.
pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
