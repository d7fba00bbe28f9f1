//! Line framer
//!
//! Splits the inbound byte stream into text lines on `\n`. No protocol
//! knowledge lives here.

use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::error::Result;

/// Line delimiter
pub const DELIMITER: u8 = b'\n';

/// Size of a single read from the transport
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Incremental line splitter
///
/// Bytes are pushed in whatever chunks the transport delivers; complete
/// lines are pulled out one at a time. There is no upper bound on line
/// length other than available memory.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: BytesMut,

    /// Bytes of `buf` already searched for a delimiter
    scanned: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes from the transport
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Pop the next complete line, without its delimiter
    ///
    /// Returns None when no complete line is buffered yet. Invalid UTF-8 is
    /// replaced rather than rejected so the line still counts toward its
    /// response.
    pub fn next_line(&mut self) -> Option<String> {
        let Some(offset) = self.buf[self.scanned..].iter().position(|&b| b == DELIMITER) else {
            self.scanned = self.buf.len();
            return None;
        };

        let end = self.scanned + offset;
        let line = self.buf.split_to(end);
        self.buf.advance(1);
        self.scanned = 0;

        match String::from_utf8(line.to_vec()) {
            Ok(line) => Some(line),
            Err(e) => {
                tracing::warn!("Line is not valid UTF-8: {}", e);
                Some(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        }
    }

    /// Bytes buffered that do not yet form a complete line
    pub fn pending_bytes(&self) -> usize {
        self.buf.len()
    }

    /// Drop everything buffered (used when a connection is torn down)
    pub fn reset(&mut self) {
        self.buf.clear();
        self.scanned = 0;
    }
}

/// Blocking line source over any reader
pub struct LineReader<R> {
    inner: R,
    framer: LineFramer,
    chunk: Box<[u8]>,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            framer: LineFramer::new(),
            chunk: vec![0u8; READ_CHUNK_SIZE].into_boxed_slice(),
        }
    }

    /// Read until one complete line is available
    ///
    /// Returns `Ok(None)` on end of stream. Trailing bytes without a
    /// delimiter at end of stream are discarded.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.framer.next_line() {
                return Ok(Some(line));
            }

            let n = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if n == 0 {
                if self.framer.pending_bytes() > 0 {
                    tracing::debug!(
                        "Discarding {} bytes of unterminated line at end of stream",
                        self.framer.pending_bytes()
                    );
                    self.framer.reset();
                }
                return Ok(None);
            }

            self.framer.push(&self.chunk[..n]);
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }
}
