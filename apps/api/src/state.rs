use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{BatchPolicy, Config};
use crate::llm_client::LanguageModel;
use crate::storage::Storage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    /// Language model seam. `LlmClient` in production, scripted in tests.
    pub llm: Arc<dyn LanguageModel>,
    pub batching: BatchPolicy,
    /// `None` keeps reports forever.
    pub report_retention: Option<Duration>,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &Config, storage: Storage, llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            storage,
            llm,
            batching: config.batching,
            report_retention: config
                .report_retention_hours
                .map(|hours| Duration::from_secs(hours * 3600)),
            static_dir: config.static_dir.clone(),
        }
    }
}
