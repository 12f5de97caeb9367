// Batch resume evaluation: resumes are screened against one or more stored
// rubrics and results are streamed back as server-sent events.

pub mod evaluator;
pub mod handlers;
pub mod models;
pub mod prompts;
