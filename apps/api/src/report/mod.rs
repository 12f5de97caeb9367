//! Report store: spreadsheet reports written once per evaluation run and
//! served back by filename.

pub mod handlers;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::evaluation::models::ReportRow;

pub const REPORT_EXTENSION: &str = "xlsx";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const DOWNLOAD_PREFIX: &str = "/resume/download-report";

const HEADERS: [&str; 4] = ["CV Name", "Verdict", "Reasons", "Rubric Name"];
const COLUMN_WIDTHS: [f64; 4] = [32.0, 12.0, 80.0, 40.0];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("Storage error: {0}")]
    Io(#[from] io::Error),
}

/// `resume_results_{timestamp}_{suffix}.xlsx`; the suffix keeps runs that
/// finish within the same second apart.
pub fn new_report_filename() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!(
        "resume_results_{}_{}.{REPORT_EXTENSION}",
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        &id[..8]
    )
}

pub fn download_link(filename: &str) -> String {
    format!("{DOWNLOAD_PREFIX}/{filename}")
}

/// True when `name` is a bare filename that can only refer to a file
/// directly inside the reports directory.
pub fn is_safe_report_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && !name.contains("..")
        && name != "."
}

/// Renders rows into an in-memory workbook.
pub fn render_workbook(rows: &[ReportRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let wrapped = Format::new().set_text_wrap();
    let sheet = workbook.add_worksheet();

    for (col, (title, width)) in HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &header)?;
        sheet.set_column_width(col, width)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, &row.cv_name)?;
        sheet.write_string(r, 1, &row.verdict)?;
        sheet.write_string_with_format(r, 2, &row.reasons, &wrapped)?;
        sheet.write_string(r, 3, &row.rubric_name)?;
    }

    workbook.save_to_buffer()
}

/// Writes a new report into `dir` and returns its filename. The file only
/// appears under its final name once fully written.
pub async fn write_report(dir: &Path, rows: Vec<ReportRow>) -> Result<String, ReportError> {
    let filename = new_report_filename();
    let target = dir.join(&filename);
    let dir = dir.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<(), ReportError> {
        let bytes = render_workbook(&rows)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(io::Error::other)??;

    info!(report = %filename, "report written");
    Ok(filename)
}

/// Deletes reports in `dir` last modified more than `max_age` ago.
/// Returns the paths removed.
pub async fn prune_reports(dir: &Path, max_age: Duration) -> io::Result<Vec<PathBuf>> {
    let cutoff = SystemTime::now()
        .checked_sub(max_age)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(REPORT_EXTENSION) {
            continue;
        }
        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read report age");
                continue;
            }
        };
        if modified < cutoff {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed.push(path),
                Err(e) => warn!(path = %path.display(), error = %e, "cannot prune report"),
            }
        }
    }

    if !removed.is_empty() {
        info!(count = removed.len(), "expired reports pruned");
    }
    Ok(removed)
}
