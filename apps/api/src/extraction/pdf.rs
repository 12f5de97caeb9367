use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Error reading PDF: {0}")]
    PdfParsing(String),

    #[error("PDF parser aborted: {0}")]
    Aborted(String),
}

/// Extracts the text layer of every page, joined by newlines.
/// Pages without extractable text contribute an empty string.
pub fn extract_text_blocking(pdf_bytes: &[u8]) -> Result<String, ExtractionError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;
    debug!(pages = pages.len(), "PDF text extracted");
    Ok(pages.join("\n"))
}

/// Runs extraction on the blocking pool. A panic inside the parser is
/// reported as an error for this document only.
pub async fn extract_pdf_text(pdf_bytes: Vec<u8>) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text_blocking(&pdf_bytes))
        .await
        .map_err(|e| ExtractionError::Aborted(e.to_string()))?
}
