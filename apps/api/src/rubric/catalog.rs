use std::io;
use std::path::PathBuf;

use anyhow::anyhow;
use serde_json::{Map, Value};
use tokio::fs;
use tracing::debug;

use crate::errors::AppError;
use crate::rubric::models::RubricDocument;
use crate::storage::file_component;

const EXTENSION: &str = "json";

/// The rubric document directory. Documents are addressed by name; the
/// on-disk file is `{name}.json`.
#[derive(Debug, Clone)]
pub struct RubricCatalog {
    dir: PathBuf,
}

/// Rubrics selected for one evaluation run, in request order.
#[derive(Debug, Clone, Default)]
pub struct RubricSet {
    entries: Vec<(String, RubricDocument)>,
}

impl RubricSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Value of the report's "Rubric Name" column.
    pub fn joined_names(&self) -> String {
        self.names().join(", ")
    }

    /// `{name: rubric}` object embedded in the evaluation prompt.
    pub fn to_prompt_json(&self) -> String {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(name, doc)| {
                (
                    name.clone(),
                    serde_json::to_value(doc).unwrap_or(Value::Null),
                )
            })
            .collect();
        Value::Object(map).to_string()
    }
}

impl FromIterator<(String, RubricDocument)> for RubricSet {
    fn from_iter<I: IntoIterator<Item = (String, RubricDocument)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl RubricCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of a document, or `None` if the name cannot be a document name.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        match file_component(name) {
            Some(component) if component == name && !name.contains("..") => {
                Some(self.dir.join(format!("{name}.{EXTENSION}")))
            }
            _ => None,
        }
    }

    /// Names of every stored document, sorted.
    pub async fn list_names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub async fn load(&self, name: &str) -> Result<Option<RubricDocument>, AppError> {
        let Some(path) = self.path_for(name) else {
            return Ok(None);
        };
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Storage(e)),
        };
        let doc = serde_json::from_str(&raw)
            .map_err(|e| AppError::Internal(anyhow!("Rubric '{name}' is not valid JSON: {e}")))?;
        Ok(Some(doc))
    }

    /// Resolves every name or fails on the first one that does not exist.
    pub async fn load_set(&self, names: &[String]) -> Result<RubricSet, AppError> {
        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let doc = self
                .load(name)
                .await?
                .ok_or_else(|| AppError::Validation(format!("Rubric not found: {name}")))?;
            entries.push((name.clone(), doc));
        }
        debug!(count = entries.len(), "rubrics resolved");
        Ok(RubricSet { entries })
    }

    pub async fn write(&self, name: &str, doc: &RubricDocument) -> io::Result<String> {
        let mut files = self.write_all(&[(name.to_string(), doc.clone())]).await?;
        Ok(files.remove(0))
    }

    /// Writes a group of documents. Every document is serialised into a temp
    /// file in the catalog directory first; only when all of them are staged
    /// are they renamed over `{name}.json`. A failure while staging leaves
    /// existing documents untouched.
    pub async fn write_all(&self, docs: &[(String, RubricDocument)]) -> io::Result<Vec<String>> {
        let mut staged = Vec::with_capacity(docs.len());
        for (name, doc) in docs {
            let path = self.path_for(name).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, format!("invalid rubric name '{name}'"))
            })?;
            staged.push((path, serde_json::to_vec_pretty(doc)?));
        }

        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            use std::io::Write;
            let mut pending = Vec::with_capacity(staged.len());
            for (target, body) in staged {
                let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
                tmp.write_all(&body)?;
                pending.push((tmp, target));
            }
            for (tmp, target) in pending {
                tmp.persist(&target).map_err(|e| e.error)?;
            }
            Ok(())
        })
        .await
        .map_err(io::Error::other)??;

        Ok(docs
            .iter()
            .map(|(name, _)| format!("{name}.{EXTENSION}"))
            .collect())
    }
}
