//! Resume Batch Evaluator.
//!
//! Resumes are grouped into batches sized by the number of selected rubrics.
//! Each batch is one streamed model call; the streamed text is accumulated in
//! full and only then searched for a JSON array of verdicts. Failures are
//! contained to the resume or batch they occur in, and every resume produces
//! exactly one outcome event and one report row.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::BatchPolicy;
use crate::evaluation::models::{EvaluationEvent, ReportRow, VerdictEvent};
use crate::evaluation::prompts::{build_system_prompt, build_user_prompt, BatchEntry};
use crate::extraction::{extract_json_array, extract_pdf_text, ExtractionError};
use crate::llm_client::stream::collect_content;
use crate::llm_client::{LanguageModel, LlmError};
use crate::report::{download_link, prune_reports, write_report};
use crate::rubric::catalog::RubricSet;
use crate::storage::{file_component, Storage};

pub const PARSE_FAILURE_REASON: &str = "Could not parse JSON from model response";
pub const MISSING_FROM_RESPONSE_REASON: &str = "Model response did not include this resume";

/// An uploaded resume, held in memory for the duration of the run.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub data: Bytes,
}

pub struct EvaluationRun {
    pub resumes: Vec<ResumeUpload>,
    pub rubrics: RubricSet,
}

#[derive(Debug, Error)]
#[error("event receiver dropped")]
pub struct Disconnected;

/// Sending half of an evaluation's event stream. A failed send means the
/// client went away and the run should stop.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<EvaluationEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<EvaluationEvent>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, event: EvaluationEvent) -> Result<(), Disconnected> {
        self.tx.send(event).await.map_err(|_| Disconnected)
    }
}

#[derive(Debug, Error)]
enum ResumeError {
    #[error("Invalid filename")]
    InvalidFilename,

    #[error("Resume working directory unavailable")]
    NoWorkDir,

    #[error("Could not save resume: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Extraction(#[from] ExtractionError),
}

struct BatchItem {
    filename: String,
    text: String,
}

#[derive(Clone)]
pub struct Evaluator {
    storage: Storage,
    llm: Arc<dyn LanguageModel>,
    batching: BatchPolicy,
    report_retention: Option<Duration>,
}

impl Evaluator {
    pub fn new(
        storage: Storage,
        llm: Arc<dyn LanguageModel>,
        batching: BatchPolicy,
        report_retention: Option<Duration>,
    ) -> Self {
        Self {
            storage,
            llm,
            batching,
            report_retention,
        }
    }

    /// Processes the whole run, emitting events as results become available.
    /// Stops early if the receiving side of `events` is dropped.
    pub async fn run(&self, run: EvaluationRun, events: EventSink) {
        let run_dir = match self.storage.create_run_dir().await {
            Ok(dir) => Some(dir),
            Err(e) => {
                error!(error = %e, "could not create resume working directory");
                None
            }
        };

        if self
            .run_batches(&run, run_dir.as_deref(), &events)
            .await
            .is_err()
        {
            info!("client disconnected, evaluation stopped early");
        }

        if let Some(dir) = run_dir {
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                warn!(dir = %dir.display(), error = %e, "could not clean resume working directory");
            }
        }
    }

    async fn run_batches(
        &self,
        run: &EvaluationRun,
        run_dir: Option<&Path>,
        events: &EventSink,
    ) -> Result<(), Disconnected> {
        let rubric_name = run.rubrics.joined_names();
        let batch_size = self.batching.batch_size(run.rubrics.len());
        let system = build_system_prompt(&run.rubrics.to_prompt_json());
        let mut rows: Vec<ReportRow> = Vec::with_capacity(run.resumes.len());

        info!(
            resumes = run.resumes.len(),
            rubrics = %rubric_name,
            batch_size,
            "evaluation started"
        );

        for (index, batch) in run.resumes.chunks(batch_size).enumerate() {
            let items = self
                .prepare_batch(batch, run_dir, events, &rubric_name, &mut rows)
                .await?;
            if items.is_empty() {
                continue;
            }

            match self.call_model(&system, &items).await {
                Ok(response) => {
                    let filenames: Vec<&str> = items.iter().map(|i| i.filename.as_str()).collect();
                    for verdict in interpret_response(&response, &filenames) {
                        rows.push(ReportRow::from_verdict(&verdict, &rubric_name));
                        events.send(EvaluationEvent::Verdict(verdict)).await?;
                    }
                    debug!(batch = index, "batch evaluated");
                }
                Err(e) => {
                    warn!(batch = index, error = %e, "model call failed for batch");
                    let message = e.to_string();
                    for item in &items {
                        rows.push(ReportRow::from_error(&item.filename, &message, &rubric_name));
                        events
                            .send(EvaluationEvent::Failed {
                                filename: item.filename.clone(),
                                error: message.clone(),
                            })
                            .await?;
                    }
                }
            }
        }

        let reports_dir = self.storage.reports_dir();
        if let Some(max_age) = self.report_retention {
            if let Err(e) = prune_reports(&reports_dir, max_age).await {
                warn!(error = %e, "report pruning failed");
            }
        }

        match write_report(&reports_dir, rows).await {
            Ok(filename) => {
                events
                    .send(EvaluationEvent::Report {
                        download_link: download_link(&filename),
                    })
                    .await?;
            }
            Err(e) => {
                error!(error = %e, "report could not be written");
                events
                    .send(EvaluationEvent::ReportFailed {
                        error: format!("Report could not be written: {e}"),
                    })
                    .await?;
            }
        }

        events.send(EvaluationEvent::End).await
    }

    /// Saves and extracts each resume. Resumes that fail are reported and
    /// left out of the model call.
    async fn prepare_batch(
        &self,
        batch: &[ResumeUpload],
        run_dir: Option<&Path>,
        events: &EventSink,
        rubric_name: &str,
        rows: &mut Vec<ReportRow>,
    ) -> Result<Vec<BatchItem>, Disconnected> {
        let mut items = Vec::with_capacity(batch.len());
        for upload in batch {
            match extract_resume(upload, run_dir).await {
                Ok(text) => {
                    events
                        .send(EvaluationEvent::Started {
                            filename: upload.filename.clone(),
                        })
                        .await?;
                    items.push(BatchItem {
                        filename: upload.filename.clone(),
                        text,
                    });
                }
                Err(e) => {
                    warn!(filename = %upload.filename, error = %e, "resume skipped");
                    let message = e.to_string();
                    rows.push(ReportRow::from_error(&upload.filename, &message, rubric_name));
                    events
                        .send(EvaluationEvent::Failed {
                            filename: upload.filename.clone(),
                            error: message,
                        })
                        .await?;
                }
            }
        }
        Ok(items)
    }

    async fn call_model(&self, system: &str, items: &[BatchItem]) -> Result<String, LlmError> {
        let entries: Vec<BatchEntry<'_>> = items
            .iter()
            .map(|i| BatchEntry {
                filename: &i.filename,
                resume: &i.text,
            })
            .collect();
        let stream = self.llm.stream(system, &build_user_prompt(&entries)).await?;
        let response = collect_content(stream).await?;
        debug!(chars = response.len(), response = %response, "evaluation model response");
        Ok(response)
    }
}

async fn extract_resume(
    upload: &ResumeUpload,
    run_dir: Option<&Path>,
) -> Result<String, ResumeError> {
    let dir = run_dir.ok_or(ResumeError::NoWorkDir)?;
    let name = file_component(&upload.filename).ok_or(ResumeError::InvalidFilename)?;
    tokio::fs::write(dir.join(name), &upload.data).await?;
    Ok(extract_pdf_text(upload.data.to_vec()).await?)
}

/// Maps one accumulated model response onto the batch's resumes, returning
/// exactly one verdict per resume in batch order.
///
/// Elements are matched by exact filename first, then loosely (ignoring case
/// and extension). Elements with a missing or unknown filename take the
/// resumes still unmatched, in batch order. Extra elements for an already
/// matched resume are dropped. Resumes left without an element get a
/// `Rejected` verdict, as does the whole batch when no array can be found.
pub fn interpret_response(response: &str, batch: &[&str]) -> Vec<VerdictEvent> {
    let Some(elements) = extract_json_array(response) else {
        warn!(
            resumes = batch.len(),
            "no JSON array in model response, rejecting batch"
        );
        return batch
            .iter()
            .map(|f| VerdictEvent::rejected(f, PARSE_FAILURE_REASON))
            .collect();
    };

    let mut assigned: Vec<Option<VerdictEvent>> = vec![None; batch.len()];
    let mut leftovers: Vec<VerdictEvent> = Vec::new();

    for verdict in elements.iter().map(VerdictEvent::from_model_value) {
        let name = verdict.filename.as_deref();
        let in_batch = name.is_some_and(|n| batch.contains(&n));
        let free = name.and_then(|n| (0..batch.len()).find(|&i| assigned[i].is_none() && batch[i] == n));
        match (free, in_batch) {
            (Some(pos), _) => assigned[pos] = Some(verdict),
            (None, true) => debug!(filename = ?verdict.filename, "duplicate verdict dropped"),
            (None, false) => leftovers.push(verdict),
        }
    }

    let mut unnamed = Vec::with_capacity(leftovers.len());
    for verdict in leftovers {
        let loose = verdict.filename.as_deref().and_then(|name| {
            (0..batch.len()).find(|&i| assigned[i].is_none() && loosely_matches(name, batch[i]))
        });
        match loose {
            Some(pos) => assigned[pos] = Some(verdict),
            None => unnamed.push(verdict),
        }
    }

    let mut unnamed = unnamed.into_iter();
    for slot in assigned.iter_mut().filter(|slot| slot.is_none()) {
        match unnamed.next() {
            Some(verdict) => *slot = Some(verdict),
            None => break,
        }
    }
    let dropped = unnamed.count();
    if dropped > 0 {
        debug!(dropped, "verdicts without a matching resume dropped");
    }

    batch
        .iter()
        .zip(assigned)
        .map(|(filename, slot)| match slot {
            Some(mut verdict) => {
                verdict.filename = Some(filename.to_string());
                verdict
            }
            None => VerdictEvent::rejected(filename, MISSING_FROM_RESPONSE_REASON),
        })
        .collect()
}

/// Same file up to letter case and extension: `"Jane_CV"` and `"jane_cv.PDF"`.
fn loosely_matches(claimed: &str, filename: &str) -> bool {
    let stem = |name: &str| {
        Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name)
            .to_ascii_lowercase()
    };
    claimed.eq_ignore_ascii_case(filename) || stem(claimed) == stem(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::models::Verdict;
    use crate::rubric::models::RubricDocument;
    use crate::test_support::{make_test_pdf, read_single_report, ScriptedModel, StreamScript};

    fn rubrics(names: &[&str]) -> RubricSet {
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    RubricDocument {
                        must_have: vec!["MS".into()],
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    fn resume(name: &str) -> ResumeUpload {
        ResumeUpload {
            filename: name.to_string(),
            data: Bytes::from(make_test_pdf(&["MS Computer Science"])),
        }
    }

    async fn setup(model: ScriptedModel) -> (Evaluator, Arc<ScriptedModel>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path());
        storage.ensure_dirs().await.unwrap();
        let model = Arc::new(model);
        let evaluator = Evaluator::new(storage, model.clone(), BatchPolicy::default(), None);
        (evaluator, model, tmp)
    }

    async fn run_to_end(evaluator: &Evaluator, run: EvaluationRun) -> Vec<EvaluationEvent> {
        let (tx, mut rx) = mpsc::channel(64);
        evaluator.run(run, EventSink::new(tx)).await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn verdicts(events: &[EvaluationEvent]) -> Vec<&VerdictEvent> {
        events
            .iter()
            .filter_map(|e| match e {
                EvaluationEvent::Verdict(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    fn failures(events: &[EvaluationEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                EvaluationEvent::Failed { filename, .. } => Some(filename.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_interpret_parsed_array() {
        let response = r#"Here you go:
[{"filename": "a.pdf", "verdict": "Accepted", "reasons": ["MS in AI"]},
 {"filename": "b.pdf", "verdict": "Rejected", "reasons": ["Only BS"]}]"#;
        let out = interpret_response(response, &["a.pdf", "b.pdf"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].verdict, Some(Verdict::Accepted));
        assert_eq!(out[1].filename.as_deref(), Some("b.pdf"));
    }

    #[test]
    fn test_interpret_without_array_rejects_every_resume() {
        let out = interpret_response("I am unable to evaluate these.", &["a.pdf", "b.pdf"]);
        assert_eq!(out.len(), 2);
        for v in &out {
            assert_eq!(v.verdict, Some(Verdict::Rejected));
            assert!(!v.reasons.is_empty());
            assert!(!v.reasons[0].is_empty());
        }
    }

    #[test]
    fn test_interpret_fills_missing_filenames_in_order() {
        let response = r#"[{"verdict": "Unclear"}, {"filename": "a.pdf", "verdict": "Accepted"}]"#;
        let out = interpret_response(response, &["a.pdf", "b.pdf"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].verdict, Some(Verdict::Accepted));
        assert_eq!(out[1].filename.as_deref(), Some("b.pdf"));
        assert_eq!(out[1].verdict, Some(Verdict::Unclear));
    }

    #[test]
    fn test_interpret_renamed_filename_is_one_verdict() {
        let response =
            r#"[{"filename": "jane", "verdict": "Accepted", "reasons": ["MS in CS"]}]"#;
        let out = interpret_response(response, &["jane.pdf"]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].filename.as_deref(), Some("jane.pdf"));
        assert_eq!(out[0].verdict, Some(Verdict::Accepted));
        assert_eq!(out[0].reasons, vec!["MS in CS"]);
    }

    #[test]
    fn test_interpret_unknown_filename_takes_unmatched_resume() {
        let response = r#"[
            {"filename": "b.pdf", "verdict": "Rejected"},
            {"filename": "candidate_1.pdf", "verdict": "Accepted"}
        ]"#;
        let out = interpret_response(response, &["a.pdf", "b.pdf"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].filename.as_deref(), Some("a.pdf"));
        assert_eq!(out[0].verdict, Some(Verdict::Accepted));
        assert_eq!(out[1].verdict, Some(Verdict::Rejected));
    }

    #[test]
    fn test_interpret_duplicate_elements_keep_first() {
        let response = r#"[
            {"filename": "a.pdf", "verdict": "Accepted"},
            {"filename": "a.pdf", "verdict": "Rejected"}
        ]"#;
        let out = interpret_response(response, &["a.pdf"]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].verdict, Some(Verdict::Accepted));
    }

    #[test]
    fn test_interpret_extra_elements_are_dropped() {
        let response = r#"[{"verdict": "Accepted"}, {"verdict": "Rejected"}, {"verdict": "Unclear"}]"#;
        let out = interpret_response(response, &["a.pdf", "b.pdf"]);
        let names: Vec<_> = out.iter().map(|v| v.filename.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_loose_filename_match() {
        assert!(loosely_matches("Jane_CV", "jane_cv.PDF"));
        assert!(loosely_matches("JANE.pdf", "jane.pdf"));
        assert!(!loosely_matches("john.pdf", "jane.pdf"));
    }

    #[test]
    fn test_interpret_never_drops_a_resume() {
        let response = r#"[{"filename": "a.pdf", "verdict": "Accepted", "reasons": []}]"#;
        let out = interpret_response(response, &["a.pdf", "b.pdf"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].filename.as_deref(), Some("b.pdf"));
        assert_eq!(out[1].reasons, vec![MISSING_FROM_RESPONSE_REASON]);
    }

    #[tokio::test]
    async fn test_single_rubric_batches_two_resumes_per_call() {
        let model = ScriptedModel::new()
            .with_stream(&[
                r#"[{"filename": "a.pdf", "verdict": "Accepted", "reasons": ["ok"]},"#,
                r#" {"filename": "b.pdf", "verdict": "Rejected", "reasons": ["no"]}]"#,
            ])
            .with_stream(&[r#"[{"filename": "c.pdf", "verdict": "Unclear", "reasons": ["?"]}]"#]);
        let (evaluator, model, _tmp) = setup(model).await;

        let events = run_to_end(
            &evaluator,
            EvaluationRun {
                resumes: vec![resume("a.pdf"), resume("b.pdf"), resume("c.pdf")],
                rubrics: rubrics(&["X_Lecturer"]),
            },
        )
        .await;

        assert_eq!(model.stream_prompts().len(), 2);
        assert_eq!(verdicts(&events).len(), 3);
        assert!(matches!(events.last(), Some(EvaluationEvent::End)));
        assert!(events
            .iter()
            .any(|e| matches!(e, EvaluationEvent::Report { download_link } if download_link.starts_with("/resume/download-report/resume_results_"))));
    }

    #[tokio::test]
    async fn test_multiple_rubrics_evaluate_one_resume_per_call() {
        let model = ScriptedModel::new()
            .with_stream(&[r#"[{"filename": "a.pdf", "verdict": "Accepted", "reasons": ["ok"]}]"#])
            .with_stream(&[r#"[{"filename": "b.pdf", "verdict": "Accepted", "reasons": ["ok"]}]"#]);
        let (evaluator, model, _tmp) = setup(model).await;

        run_to_end(
            &evaluator,
            EvaluationRun {
                resumes: vec![resume("a.pdf"), resume("b.pdf")],
                rubrics: rubrics(&["X_Lecturer", "X_Professor"]),
            },
        )
        .await;

        let prompts = model.stream_prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].0.contains("X_Professor"));
        assert!(prompts[0].1.contains("a.pdf"));
        assert!(!prompts[0].1.contains("b.pdf"));
    }

    #[tokio::test]
    async fn test_model_failure_reports_each_resume_and_continues() {
        let model = ScriptedModel::new()
            .with_stream_script(StreamScript::OpenError(LlmError::Api {
                status: 429,
                message: "rate limit".into(),
            }))
            .with_stream(&[r#"[{"filename": "c.pdf", "verdict": "Accepted", "reasons": ["ok"]}]"#]);
        let (evaluator, _model, _tmp) = setup(model).await;

        let events = run_to_end(
            &evaluator,
            EvaluationRun {
                resumes: vec![resume("a.pdf"), resume("b.pdf"), resume("c.pdf")],
                rubrics: rubrics(&["X_Lecturer"]),
            },
        )
        .await;

        assert_eq!(failures(&events), vec!["a.pdf", "b.pdf"]);
        let v = verdicts(&events);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].filename.as_deref(), Some("c.pdf"));
        assert!(matches!(events.last(), Some(EvaluationEvent::End)));
    }

    #[tokio::test]
    async fn test_report_has_one_row_per_resume() {
        let model = ScriptedModel::new()
            .with_stream(&[
                r#"[{"filename": "a.pdf", "verdict": "Accepted", "reasons": ["PhD", "HEC recognized"]}]"#,
            ])
            .with_stream(&["I could not decide."]);
        let (evaluator, _model, tmp) = setup(model).await;

        run_to_end(
            &evaluator,
            EvaluationRun {
                resumes: vec![
                    ResumeUpload {
                        filename: "broken.pdf".into(),
                        data: Bytes::from_static(b"not a pdf"),
                    },
                    resume("a.pdf"),
                    resume("b.pdf"),
                ],
                rubrics: rubrics(&["X_Lecturer", "X_Professor"]),
            },
        )
        .await;

        let rows = read_single_report(&Storage::new(tmp.path()).reports_dir());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], vec!["CV Name", "Verdict", "Reasons", "Rubric Name"]);
        assert_eq!(rows[1][0], "broken.pdf");
        assert_eq!(rows[1][1], "Error");
        assert!(!rows[1][2].is_empty());
        assert_eq!(
            rows[2],
            vec!["a.pdf", "Accepted", "PhD\nHEC recognized", "X_Lecturer, X_Professor"]
        );
        assert_eq!(rows[3][1], "Rejected");
        assert_eq!(rows[3][2], PARSE_FAILURE_REASON);
        assert!(rows[1..].iter().all(|r| r[3] == "X_Lecturer, X_Professor"));
    }

    #[tokio::test]
    async fn test_report_write_failure_is_an_event() {
        let model = ScriptedModel::new()
            .with_stream(&[r#"[{"filename": "a.pdf", "verdict": "Accepted", "reasons": []}]"#]);
        let (evaluator, _model, tmp) = setup(model).await;
        let reports = Storage::new(tmp.path()).reports_dir();
        std::fs::remove_dir(&reports).unwrap();
        std::fs::write(&reports, b"").unwrap();

        let events = run_to_end(
            &evaluator,
            EvaluationRun {
                resumes: vec![resume("a.pdf")],
                rubrics: rubrics(&["X_Lecturer"]),
            },
        )
        .await;

        assert!(!events
            .iter()
            .any(|e| matches!(e, EvaluationEvent::Report { .. })));
        let n = events.len();
        assert!(matches!(
            &events[n - 2],
            EvaluationEvent::ReportFailed { error } if error.starts_with("Report could not be written")
        ));
        assert!(matches!(events[n - 1], EvaluationEvent::End));
    }

    #[tokio::test]
    async fn test_mid_stream_error_fails_the_batch() {
        let model = ScriptedModel::new().with_stream_script(StreamScript::Chunks(vec![
            Ok("[{\"filename\": \"a.pdf\"".into()),
            Err(LlmError::Stream("connection reset".into())),
        ]));
        let (evaluator, _model, _tmp) = setup(model).await;

        let events = run_to_end(
            &evaluator,
            EvaluationRun {
                resumes: vec![resume("a.pdf")],
                rubrics: rubrics(&["X_Lecturer"]),
            },
        )
        .await;

        assert_eq!(failures(&events), vec!["a.pdf"]);
        assert!(verdicts(&events).is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_resume_is_excluded_from_model_call() {
        let model = ScriptedModel::new()
            .with_stream(&[r#"[{"filename": "good.pdf", "verdict": "Accepted", "reasons": ["ok"]}]"#]);
        let (evaluator, model, _tmp) = setup(model).await;

        let events = run_to_end(
            &evaluator,
            EvaluationRun {
                resumes: vec![
                    ResumeUpload {
                        filename: "broken.pdf".into(),
                        data: Bytes::from_static(b"not a pdf"),
                    },
                    resume("good.pdf"),
                ],
                rubrics: rubrics(&["X_Lecturer"]),
            },
        )
        .await;

        assert_eq!(failures(&events), vec!["broken.pdf"]);
        let prompts = model.stream_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(!prompts[0].1.contains("broken.pdf"));
        assert!(matches!(
            &events[0],
            EvaluationEvent::Failed { filename, .. } if filename == "broken.pdf"
        ));
    }

    #[tokio::test]
    async fn test_unparseable_response_rejects_batch() {
        let model = ScriptedModel::new().with_stream(&["<think>hmm</think>", " Both look fine."]);
        let (evaluator, _model, _tmp) = setup(model).await;

        let events = run_to_end(
            &evaluator,
            EvaluationRun {
                resumes: vec![resume("a.pdf"), resume("b.pdf")],
                rubrics: rubrics(&["X_Lecturer"]),
            },
        )
        .await;

        let v = verdicts(&events);
        assert_eq!(v.len(), 2);
        assert!(v.iter().all(|v| v.verdict == Some(Verdict::Rejected)
            && v.reasons == vec![PARSE_FAILURE_REASON]));
    }

    #[tokio::test]
    async fn test_working_directory_is_cleaned_up() {
        let model = ScriptedModel::new()
            .with_stream(&[r#"[{"filename": "a.pdf", "verdict": "Accepted", "reasons": []}]"#]);
        let (evaluator, _model, tmp) = setup(model).await;

        run_to_end(
            &evaluator,
            EvaluationRun {
                resumes: vec![resume("a.pdf")],
                rubrics: rubrics(&["X_Lecturer"]),
            },
        )
        .await;

        let uploads = Storage::new(tmp.path()).resume_uploads_dir();
        assert_eq!(std::fs::read_dir(uploads).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_the_run() {
        let model = ScriptedModel::new()
            .with_stream(&[r#"[{"filename": "a.pdf", "verdict": "Accepted", "reasons": []}]"#])
            .with_stream(&[r#"[{"filename": "b.pdf", "verdict": "Accepted", "reasons": []}]"#]);
        let (evaluator, model, tmp) = setup(model).await;

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        evaluator
            .run(
                EvaluationRun {
                    resumes: vec![resume("a.pdf"), resume("b.pdf")],
                    rubrics: rubrics(&["X_Lecturer", "X_Professor"]),
                },
                EventSink::new(tx),
            )
            .await;

        assert!(model.stream_prompts().is_empty());
        let reports = Storage::new(tmp.path()).reports_dir();
        assert_eq!(std::fs::read_dir(reports).unwrap().count(), 0);
    }
}
