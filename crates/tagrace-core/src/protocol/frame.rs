//! Line framing for the delimited stream body.
//!
//! Parsing rules:
//! - Never index past `len()`; split with `BytesMut::split_to`.
//! - Lines end with `\n`; a trailing `\r` is dropped.
//! - Blank lines are keep-alives and are skipped.
//! - Bytes already searched for `\n` are not searched again.

use bytes::{Bytes, BytesMut};

use crate::error::{Result, TagRaceError};

/// Default cap on a single undelimited line.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1 << 20;

#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    /// Prefix of `buf` known to hold no `\n`. Always `<= buf.len()`.
    scanned: usize,
    max_line_bytes: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

impl LineFramer {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            scanned: 0,
            max_line_bytes: max_line_bytes.max(1),
        }
    }

    /// Append a chunk received from the transport.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes buffered but not yet returned as a line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next complete, non-blank line.
    ///
    /// Returns `Ok(None)` when more bytes are needed. A line longer than the
    /// cap, complete or not, is discarded and reported as an error; framing
    /// resumes after it.
    pub fn next_line(&mut self) -> Result<Option<Bytes>> {
        loop {
            let unscanned = self.buf.get(self.scanned..).unwrap_or(&[]);
            let Some(pos) = unscanned
                .iter()
                .position(|b| *b == b'\n')
                .map(|i| self.scanned + i)
            else {
                if self.buf.len() > self.max_line_bytes {
                    let len = self.buf.len();
                    self.buf.clear();
                    self.scanned = 0;
                    return Err(self.oversized(len));
                }
                self.scanned = self.buf.len();
                return Ok(None);
            };

            self.scanned = 0;
            let mut line = self.buf.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            if line.len() > self.max_line_bytes {
                return Err(self.oversized(line.len()));
            }
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }
            return Ok(Some(line.freeze()));
        }
    }

    fn oversized(&self, len: usize) -> TagRaceError {
        TagRaceError::Stream(format!(
            "line exceeds {} bytes (got {len})",
            self.max_line_bytes
        ))
    }
}
