use std::path::PathBuf;

use anyhow::{bail, Context, Result};

pub const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_RUBRIC_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
pub const DEFAULT_EVALUATION_MODEL: &str = "deepseek-r1-distill-llama-70b";

/// Application configuration loaded from environment variables.
/// Startup fails if the model credential is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub llm_api_url: String,
    pub rubric_model: String,
    pub evaluation_model: String,
    pub data_root: PathBuf,
    pub static_dir: PathBuf,
    pub batching: BatchPolicy,
    /// `None` keeps reports forever.
    pub report_retention_hours: Option<u64>,
    pub port: u16,
    pub rust_log: String,
}

/// How many resumes go into one model call.
/// More rubrics in the prompt means fewer resumes per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub single_rubric: usize,
    pub multi_rubric: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            single_rubric: 2,
            multi_rubric: 1,
        }
    }
}

impl BatchPolicy {
    pub fn new(single_rubric: usize, multi_rubric: usize) -> Result<Self> {
        if single_rubric == 0 || multi_rubric == 0 {
            bail!("batch sizes must be at least 1");
        }
        if multi_rubric > single_rubric {
            bail!(
                "BATCH_SIZE_MULTI_RUBRIC ({multi_rubric}) must not exceed BATCH_SIZE_SINGLE_RUBRIC ({single_rubric})"
            );
        }
        Ok(Self {
            single_rubric,
            multi_rubric,
        })
    }

    pub fn batch_size(&self, rubric_count: usize) -> usize {
        if rubric_count > 1 {
            self.multi_rubric
        } else {
            self.single_rubric
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let groq_api_key = require_env("GROQ_API_KEY")?;
        if groq_api_key.trim().is_empty() {
            bail!("Required environment variable 'GROQ_API_KEY' is empty");
        }

        let batching = BatchPolicy::new(
            parse_env("BATCH_SIZE_SINGLE_RUBRIC", 2)?,
            parse_env("BATCH_SIZE_MULTI_RUBRIC", 1)?,
        )?;

        let report_retention_hours = match std::env::var("REPORT_RETENTION_HOURS") {
            Ok(v) if !v.trim().is_empty() => Some(
                v.trim()
                    .parse::<u64>()
                    .context("REPORT_RETENTION_HOURS must be a whole number of hours")?,
            ),
            _ => None,
        };

        Ok(Config {
            groq_api_key,
            llm_api_url: env_or("LLM_API_URL", DEFAULT_LLM_API_URL),
            rubric_model: env_or("RUBRIC_MODEL", DEFAULT_RUBRIC_MODEL),
            evaluation_model: env_or("EVALUATION_MODEL", DEFAULT_EVALUATION_MODEL),
            data_root: PathBuf::from(env_or("DATA_ROOT", ".")),
            static_dir: PathBuf::from(env_or("STATIC_DIR", "static")),
            batching,
            report_retention_hours,
            port: parse_env("PORT", 5000)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
