use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::ClientError;

/// Growing reply text, one item per body chunk.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// Incremental UTF-8 decoder. A multi-byte sequence split across two chunks
/// is held back until the rest arrives; invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    out.push_str(s);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                    }
                }
            }
        }

        out
    }

    /// Flushes bytes left over when the stream ends mid-sequence.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(tail)
    }
}

/// Concatenation of every chunk decoded so far.
#[derive(Debug, Default)]
pub struct Accumulator {
    decoder: Utf8Decoder,
    text: String,
    chunks: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one chunk and returns the full text so far.
    pub fn push(&mut self, chunk: &[u8]) -> &str {
        let decoded = self.decoder.decode(chunk);
        self.text.push_str(&decoded);
        self.chunks += 1;
        &self.text
    }

    /// Appends any undecodable tail. Returns `true` if the text changed.
    pub fn finish(&mut self) -> bool {
        match self.decoder.finish() {
            Some(tail) => {
                self.text.push_str(&tail);
                true
            }
            None => false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Turns a byte-chunk stream into a stream of accumulated text.
///
/// Publishes after every chunk. A transport error is yielded once and ends
/// the stream; nothing is retried.
pub fn accumulate<S, E>(chunks: S) -> TextStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ClientError> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut chunks = std::pin::pin!(chunks);
        let mut acc = Accumulator::new();

        while let Some(item) = chunks.next().await {
            match item {
                Ok(bytes) => {
                    yield Ok(acc.push(&bytes).to_string());
                }
                Err(e) => {
                    let err: ClientError = e.into();
                    warn!("chat stream interrupted after {} chunks: {}", acc.chunks(), err);
                    yield Err(err);
                    return;
                }
            }
        }

        if acc.finish() {
            yield Ok(acc.text().to_string());
        }
        debug!("chat stream finished: {} chunks, {} bytes", acc.chunks(), acc.text().len());
    })
}
