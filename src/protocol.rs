//! HTTP/1.0 wire format: request encoding, status line and header parsing.
//!
//! Only the subset a plain GET needs is handled. Header parsing looks for a
//! single field, `Content-Length`, matched on its literal spelling.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// Prefix every valid version token starts with
pub const VERSION_PREFIX: &str = "HTTP/";

/// Literal header prefix scanned for in the header block
pub const CONTENT_LENGTH_PREFIX: &str = "Content-Length: ";

/// End of a single line
pub const LINE_END: &[u8] = b"\r\n";

/// End of the header block
pub const HEADER_END: &[u8] = b"\r\n\r\n";

/// Parsed status line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    /// Version token, e.g. `HTTP/1.0`
    pub version: String,
    /// Numeric status code
    pub code: u32,
    /// Remainder of the line, trimmed; may be empty
    pub message: String,
}

/// Encode the GET request sent for `path` on `host`
///
/// An IPv6 literal is written in brackets in the `Host` field.
pub fn build_request(host: &str, path: &str) -> Vec<u8> {
    let host = host_header(host);
    format!(
        "GET {path} HTTP/1.0\r\nHost: {host}\r\nAccept: */*\r\nConnection: close\r\n\r\n"
    )
    .into_bytes()
}

fn host_header(host: &str) -> Cow<'_, str> {
    if host.contains(':') && !host.starts_with('[') {
        Cow::Owned(format!("[{host}]"))
    } else {
        Cow::Borrowed(host)
    }
}

/// Parse a status line (with or without its trailing CRLF)
///
/// The line is split into whitespace-separated tokens: the version, the
/// numeric code and the rest as the message.
pub fn parse_status_line(line: &[u8]) -> Result<StatusLine> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim_start();

    let (version, rest) = split_token(text);
    let (code, rest) = split_token(rest);

    let code: u32 = code
        .parse()
        .map_err(|_| invalid(format!("malformed status line {:?}", text.trim_end())))?;

    if !version.starts_with(VERSION_PREFIX) {
        return Err(invalid(format!("unexpected version token {version:?}")));
    }

    Ok(StatusLine {
        version: version.to_string(),
        code,
        message: rest.trim().to_string(),
    })
}

/// Reject anything but 200
pub fn check_status(status: &StatusLine) -> Result<()> {
    if status.code == 200 {
        return Ok(());
    }
    Err(Error::BadStatus {
        code: status.code,
        message: status.message.clone(),
    })
}

/// Find `Content-Length` in a header block
///
/// `block` holds the header lines after the status line, up to and including
/// the blank line. Scanning stops at the blank line. When the field appears
/// more than once the last value wins.
pub fn parse_content_length(block: &[u8]) -> Result<Option<u64>> {
    let text = String::from_utf8_lossy(block);
    let mut content_length = None;

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix(CONTENT_LENGTH_PREFIX) {
            let value = value.trim();
            let parsed = value
                .parse::<u64>()
                .map_err(|_| invalid(format!("bad Content-Length value {value:?}")))?;
            content_length = Some(parsed);
        }
    }

    Ok(content_length)
}

fn split_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], &text[end..]),
        None => (text, ""),
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidResponse(message)
}
