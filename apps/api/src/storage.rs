//! On-disk layout. Every directory hangs off one configured root so each
//! component receives its paths explicitly.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Working cache for uploaded resumes.
    pub fn resume_uploads_dir(&self) -> PathBuf {
        self.root.join("uploads").join("resume_uploads")
    }

    /// Raw rubric source PDFs as uploaded.
    pub fn rubric_uploads_dir(&self) -> PathBuf {
        self.root.join("uploads").join("rubric_uploads")
    }

    /// Generated rubric JSON documents.
    pub fn rubrics_dir(&self) -> PathBuf {
        self.root.join("Rubrics")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("uploads").join("reports")
    }

    pub async fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [
            self.resume_uploads_dir(),
            self.rubric_uploads_dir(),
            self.rubrics_dir(),
            self.reports_dir(),
        ] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }

    /// Creates a fresh per-run directory for resume bytes so concurrent runs
    /// with the same filenames never overwrite each other.
    pub async fn create_run_dir(&self) -> io::Result<PathBuf> {
        let dir = self.resume_uploads_dir().join(Uuid::new_v4().simple().to_string());
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }
}

/// Reduces a client-supplied filename to a single path component.
/// Returns `None` for names that would escape the target directory.
pub fn file_component(name: &str) -> Option<&str> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Some(last)
}
