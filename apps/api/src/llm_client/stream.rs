//! Decoding of server-sent chat completion chunks.
//!
//! The provider sends `data: {json}` lines separated by blank lines and ends
//! with `data: [DONE]`. Bytes can split lines (and UTF-8 sequences) anywhere,
//! so decoding buffers raw bytes until a newline arrives.

use std::collections::VecDeque;

use bytes::Bytes;
use futures_util::{stream, Stream, StreamExt};
use serde::Deserialize;

use super::{ApiErrorEnvelope, ContentStream, LlmError};

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug)]
pub enum Decoded {
    Content(String),
    Done,
    Error(LlmError),
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feeds raw bytes; returns everything decodable from complete lines.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        self.buffer.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(decoded) = decode_line(&String::from_utf8_lossy(&line)) {
                out.push(decoded);
            }
        }
        out
    }

    /// Decodes a trailing line that arrived without a newline.
    pub fn finish(&mut self) -> Option<Decoded> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        decode_line(&String::from_utf8_lossy(&line))
    }
}

fn decode_line(line: &str) -> Option<Decoded> {
    let data = line.trim_end_matches(['\r', '\n']).strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(Decoded::Done);
    }
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(data) {
        return Some(Decoded::Error(LlmError::Stream(envelope.error.message)));
    }
    match serde_json::from_str::<ChunkPayload>(data) {
        Ok(payload) => {
            let content: String = payload
                .choices
                .into_iter()
                .filter_map(|c| c.delta.content)
                .collect();
            (!content.is_empty()).then_some(Decoded::Content(content))
        }
        Err(e) => Some(Decoded::Error(LlmError::Stream(format!(
            "malformed chunk: {e}"
        )))),
    }
}

/// Adapts a raw byte stream into a stream of content deltas.
/// Ends after `[DONE]`, the first error, or the end of the body.
pub fn content_stream<S>(bytes: S) -> ContentStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let state = (
        Box::pin(bytes),
        SseDecoder::default(),
        VecDeque::<Result<String, LlmError>>::new(),
        false,
    );

    stream::unfold(
        state,
        |(mut bytes, mut decoder, mut pending, mut finished)| async move {
            loop {
                if let Some(item) = pending.pop_front() {
                    return Some((item, (bytes, decoder, pending, finished)));
                }
                if finished {
                    return None;
                }
                let decoded = match bytes.next().await {
                    Some(Ok(chunk)) => decoder.push(&chunk),
                    Some(Err(e)) => {
                        pending.push_back(Err(LlmError::Http(e)));
                        finished = true;
                        continue;
                    }
                    None => {
                        finished = true;
                        decoder.finish().into_iter().collect()
                    }
                };
                for item in decoded {
                    match item {
                        Decoded::Content(text) => pending.push_back(Ok(text)),
                        Decoded::Done => {
                            finished = true;
                            break;
                        }
                        Decoded::Error(e) => {
                            pending.push_back(Err(e));
                            finished = true;
                            break;
                        }
                    }
                }
            }
        },
    )
    .boxed()
}

/// Concatenates every content chunk into one response string.
/// The first stream error aborts the accumulation.
pub async fn collect_content(mut stream: ContentStream) -> Result<String, LlmError> {
    let mut response = String::new();
    while let Some(chunk) = stream.next().await {
        response.push_str(&chunk?);
    }
    Ok(response)
}
