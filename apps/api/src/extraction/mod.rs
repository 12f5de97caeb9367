// Text and JSON extraction: PDF bytes to plain text, and model output to
// JSON values. Everything here is free of I/O beyond the bytes handed in.

pub mod json;
pub mod pdf;

pub use json::{extract_json_array, extract_json_object, JsonExtractError};
pub use pdf::{extract_pdf_text, ExtractionError};
