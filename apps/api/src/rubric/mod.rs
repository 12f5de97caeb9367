// Rubric ingestion and catalog.
// A rubric is extracted from a job advertisement PDF by the language model and
// stored as one JSON document per job title.

pub mod catalog;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod prompts;
