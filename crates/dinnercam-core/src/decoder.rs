//! Chunk-to-line decoding for the event stream.
//!
//! The transport hands over arbitrarily sized chunks; frames are complete
//! newline-terminated lines. The decoder carries the trailing partial line
//! across chunk boundaries.

use crate::error::EngineError;

/// Maximum buffer size (4 MB) to prevent unbounded memory growth from
/// malformed/malicious streams that never send newlines.
const MAX_BUFFER_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Feed one chunk and return the complete lines it makes available.
    ///
    /// The trailing partial line stays buffered until a later chunk
    /// terminates it. A stream that closes mid-line discards that fragment:
    /// frames must be newline-terminated, so an unterminated tail is never a
    /// valid frame.
    pub fn feed(&mut self, chunk: &str) -> Result<Vec<String>, EngineError> {
        self.buffer.push_str(chunk);

        if self.buffer.len() > MAX_BUFFER_SIZE {
            self.buffer.clear();
            return Err(EngineError::LineBufferOverflow {
                max: MAX_BUFFER_SIZE,
            });
        }

        let mut lines = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline_pos).collect();
            lines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }
        Ok(lines)
    }
}
