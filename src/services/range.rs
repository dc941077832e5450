//! `Range: bytes=...` parsing (RFC 7233, single range only).
//!
//! Pure over `(header, size)` so it can be tested without HTTP types.

/// An inclusive byte range inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered; never zero.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a file of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// Why a range header cannot be served.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("range header must use the bytes unit")]
    Unit,
    #[error("malformed range spec")]
    Malformed,
    #[error("multiple ranges are not supported")]
    MultipleRanges,
    #[error("range is outside the file")]
    Unsatisfiable,
}

fn parse_position(raw: &str) -> Result<u64, RangeError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed);
    }
    raw.parse::<u64>().map_err(|_| RangeError::Malformed)
}

/// Parse a `Range` header value against a file of `size` bytes.
///
/// `bytes=a-b` needs `a <= b < size`, `bytes=a-` needs `a < size`, and the suffix
/// form `bytes=-k` needs `0 < k <= size`. An end past the file is rejected rather
/// than clamped.
pub fn parse_range(header: &str, size: u64) -> Result<ByteRange, RangeError> {
    let spec = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::Unit)?;

    let mut specs = spec.split(',').map(str::trim).filter(|s| !s.is_empty());
    let first = specs.next().ok_or(RangeError::Malformed)?;
    if specs.next().is_some() {
        return Err(RangeError::MultipleRanges);
    }

    let (start, end) = first.split_once('-').ok_or(RangeError::Malformed)?;
    let (start, end) = (start.trim(), end.trim());

    let range = match (start.is_empty(), end.is_empty()) {
        (true, true) => return Err(RangeError::Malformed),
        (true, false) => {
            let suffix = parse_position(end)?;
            if suffix == 0 || suffix > size {
                return Err(RangeError::Unsatisfiable);
            }
            ByteRange {
                start: size - suffix,
                end: size - 1,
            }
        }
        (false, open_end) => {
            let start = parse_position(start)?;
            if start >= size {
                return Err(RangeError::Unsatisfiable);
            }
            let end = if open_end {
                size - 1
            } else {
                parse_position(end)?
            };
            if end >= size || start > end {
                return Err(RangeError::Unsatisfiable);
            }
            ByteRange { start, end }
        }
    };

    Ok(range)
}
