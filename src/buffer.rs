//! Append-only response buffer shared between the handshake and body phases.

/// Growable byte container holding everything read from one connection
///
/// Bytes are only ever appended. Once the header block has been parsed the
/// buffer remembers where it ends, so [`body`](Self::body) returns the bytes
/// after the blank line, including any read ahead by the header read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseBuffer {
    bytes: Vec<u8>,
    header_end: Option<usize>,
}

impl ResponseBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            header_end: None,
        }
    }

    /// Total number of bytes buffered
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when nothing has been read yet
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Everything buffered, headers and body
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Offset one past the blank line ending the header block, once parsed
    pub fn header_end(&self) -> Option<usize> {
        self.header_end
    }

    /// Status line and header block, including the terminating blank line
    ///
    /// Empty until the header block has been parsed.
    pub fn headers(&self) -> &[u8] {
        match self.header_end {
            Some(end) => &self.bytes[..end],
            None => &[],
        }
    }

    /// Body bytes received so far
    ///
    /// Empty until the header block has been parsed.
    pub fn body(&self) -> &[u8] {
        match self.header_end {
            Some(end) => &self.bytes[end..],
            None => &[],
        }
    }

    /// Consume the buffer, returning all bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub(crate) fn extend(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    pub(crate) fn mark_header_end(&mut self, end: usize) {
        debug_assert!(end <= self.bytes.len());
        self.header_end = Some(end);
    }

    /// Offset one past the first `delimiter` found at or after `from`
    pub(crate) fn find(&self, from: usize, delimiter: &[u8]) -> Option<usize> {
        if from >= self.bytes.len() {
            return None;
        }
        self.bytes[from..]
            .windows(delimiter.len())
            .position(|window| window == delimiter)
            .map(|pos| from + pos + delimiter.len())
    }
}
