//! Fixtures shared by unit and router tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};

use crate::llm_client::{ContentStream, LanguageModel, LlmError};

/// Builds a PDF with one page per entry, each carrying a single line of text.
pub fn make_test_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Cell text of the first worksheet of an xlsx file, header row included.
pub fn read_report(bytes: &[u8]) -> Vec<Vec<String>> {
    use calamine::{open_workbook_from_rs, Reader, Xlsx};

    let mut workbook: Xlsx<_> = open_workbook_from_rs(std::io::Cursor::new(bytes.to_vec())).unwrap();
    let range = workbook.worksheet_range_at(0).unwrap().unwrap();
    range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

/// Reads the only report written under `dir`.
pub fn read_single_report(dir: &std::path::Path) -> Vec<Vec<String>> {
    let mut reports: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(reports.len(), 1, "expected exactly one report in {}", dir.display());
    read_report(&std::fs::read(reports.remove(0)).unwrap())
}

pub enum StreamScript {
    /// The call fails before any chunk arrives.
    OpenError(LlmError),
    Chunks(Vec<Result<String, LlmError>>),
}

/// A `LanguageModel` that replays queued responses and records prompts.
#[derive(Default)]
pub struct ScriptedModel {
    completions: Mutex<VecDeque<Result<String, LlmError>>>,
    streams: Mutex<VecDeque<StreamScript>>,
    completion_prompts: Mutex<Vec<String>>,
    stream_prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_completion(self, response: Result<String, LlmError>) -> Self {
        self.completions.lock().unwrap().push_back(response);
        self
    }

    /// Queues a streamed response delivered as the given chunks.
    pub fn with_stream(self, chunks: &[&str]) -> Self {
        let chunks = chunks.iter().map(|c| Ok(c.to_string())).collect();
        self.streams
            .lock()
            .unwrap()
            .push_back(StreamScript::Chunks(chunks));
        self
    }

    pub fn with_stream_script(self, script: StreamScript) -> Self {
        self.streams.lock().unwrap().push_back(script);
        self
    }

    pub fn completion_prompts(&self) -> Vec<String> {
        self.completion_prompts.lock().unwrap().clone()
    }

    /// `(system, user)` pairs of every streamed call, in order.
    pub fn stream_prompts(&self) -> Vec<(String, String)> {
        self.stream_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.completion_prompts
            .lock()
            .unwrap()
            .push(prompt.to_string());
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }

    async fn stream(&self, system: &str, prompt: &str) -> Result<ContentStream, LlmError> {
        self.stream_prompts
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        let script = self.streams.lock().unwrap().pop_front();
        match script {
            Some(StreamScript::Chunks(chunks)) => Ok(stream::iter(chunks).boxed()),
            Some(StreamScript::OpenError(e)) => Err(e),
            None => Err(LlmError::Stream("no scripted response".into())),
        }
    }
}

const BOUNDARY: &str = "----screener-test-boundary";

/// Hand-built `multipart/form-data` bodies for router tests.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn build(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}
