//! Incremental server-sent events decoder
//!
//! Only the `data` field is interpreted. Events are separated by a blank line
//! and may be split across any number of network chunks.

use super::{ModelError, ModelResult};

/// Decoder that turns a chunked byte stream into SSE `data` payloads
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event completed by it
    pub fn push(&mut self, chunk: &[u8]) -> ModelResult<Vec<String>> {
        self.buf.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(idx) = find_boundary(&self.buf) {
            let raw: Vec<u8> = self.buf.drain(..idx + 2).collect();
            if let Some(data) = parse_event(&raw[..idx])? {
                events.push(data);
            }
        }
        Ok(events)
    }

    /// Flush a trailing event that was not terminated by a blank line
    pub fn finish(&mut self) -> ModelResult<Option<String>> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        let raw = std::mem::take(&mut self.buf);
        parse_event(&raw)
    }
}

fn find_boundary(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

fn parse_event(raw: &[u8]) -> ModelResult<Option<String>> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| ModelError::InvalidResponse(format!("event is not UTF-8: {e}")))?;

    let mut data: Option<String> = None;
    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field != "data" {
            continue;
        }
        match data.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(value);
            }
            None => data = Some(value.to_string()),
        }
    }
    Ok(data)
}
