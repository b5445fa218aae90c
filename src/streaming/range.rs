//! HTTP `Range` header handling.
//!
//! Only single `bytes=<start>-[<end>]` ranges are accepted. Parsing and
//! resolution are split so the header can be validated before the file size
//! is known and checked against it afterwards.

use super::StreamError;

/// A `Range` header as written by the client, not yet checked against a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: u64,
    /// `None` for open-ended ranges like `bytes=500-`.
    pub end: Option<u64>,
}

/// An inclusive byte window inside a resource of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered, `end - start + 1`.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` response header.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// Parse a `Range: bytes=START-END` header value.
///
/// Supports formats:
/// - bytes=0-499
/// - bytes=500-
///
/// Suffix ranges (`bytes=-500`), multiple ranges and other units are
/// rejected as malformed.
pub fn parse_range_header(value: &str) -> Result<RangeSpec, StreamError> {
    let malformed = || StreamError::MalformedRange(value.to_string());

    let spec = value.trim().strip_prefix("bytes=").ok_or_else(malformed)?;
    if spec.contains(',') {
        return Err(malformed());
    }

    let (start, end) = spec.split_once('-').ok_or_else(malformed)?;
    let start = start.trim();
    let end = end.trim();

    let start: u64 = parse_position(start).ok_or_else(malformed)?;
    let end = if end.is_empty() {
        None
    } else {
        Some(parse_position(end).ok_or_else(malformed)?)
    };

    Ok(RangeSpec { start, end })
}

/// Base-10 digits only; `u64::from_str` would also take a leading `+`.
fn parse_position(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl RangeSpec {
    /// Check the range against a resource of `size` bytes.
    ///
    /// A missing `end` means the last byte; an `end` past the last byte is
    /// clamped to it. Ranges starting at or past the end of the resource, or
    /// with `start > end`, are not satisfiable.
    pub fn resolve(self, size: u64) -> Result<ByteRange, StreamError> {
        if self.start >= size {
            return Err(StreamError::RangeNotSatisfiable { size });
        }

        let last = size - 1;
        let end = self.end.map_or(last, |end| end.min(last));
        if self.start > end {
            return Err(StreamError::RangeNotSatisfiable { size });
        }

        Ok(ByteRange {
            start: self.start,
            end,
        })
    }
}
