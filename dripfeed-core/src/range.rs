//! HTTP Range header parsing and resolution
//!
//! Implements the subset of RFC 7233 byte-range semantics the download
//! endpoints rely on: single ranges in `bytes=A-B`, `bytes=A-` and
//! `bytes=-N` form. Unparseable headers are treated as if no Range header
//! was sent at all; a range that resolves to an empty span is rejected as
//! unsatisfiable rather than crashing the request.

use thiserror::Error;

/// A parsed `Range` header, before validation against a concrete file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `bytes=A-`: everything from offset A to the end of the file.
    FromOffset(u64),
    /// `bytes=-N`: the last N bytes of the file.
    Suffix(u64),
    /// `bytes=A-B`: inclusive byte span.
    Explicit(u64, u64),
}

/// A byte span resolved against a file's total size.
///
/// Invariant: `start + length <= total_size` for the size it was resolved
/// against, and `length > 0` unless the whole file is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    /// Offset of the first byte to serve.
    pub start: u64,
    /// Number of bytes to serve.
    pub length: u64,
}

impl ResolvedRange {
    /// The full span of a file, used when no Range header applies.
    pub fn full(total_size: u64) -> Self {
        Self {
            start: 0,
            length: total_size,
        }
    }

    /// Inclusive offset of the last byte, for `Content-Range` reporting.
    pub fn end(&self) -> u64 {
        self.start + self.length.saturating_sub(1)
    }
}

/// Range resolution failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("requested range not satisfiable for size {total_size}")]
    Unsatisfiable { total_size: u64 },
}

/// Parse a `Range` header value into a [`RangeSpec`].
///
/// Returns `None` for anything that does not look like a single byte
/// range; callers fall back to serving the full file in that case.
/// A bare `bytes=` or `bytes=-` parses as the full span from offset 0,
/// which still counts as a (satisfied) range request.
pub fn parse_range_header(value: &str) -> Option<RangeSpec> {
    let spec = value.strip_prefix("bytes=")?;
    match spec.split_once('-') {
        None => {
            if spec.is_empty() {
                Some(RangeSpec::FromOffset(0))
            } else {
                spec.parse().ok().map(RangeSpec::FromOffset)
            }
        }
        Some(("", "")) => Some(RangeSpec::FromOffset(0)),
        Some(("", suffix)) => suffix.parse().ok().map(RangeSpec::Suffix),
        Some((start, "")) => start.parse().ok().map(RangeSpec::FromOffset),
        Some((start, end)) => {
            let start = start.parse().ok()?;
            let end = end.parse().ok()?;
            Some(RangeSpec::Explicit(start, end))
        }
    }
}

impl RangeSpec {
    /// Resolve the spec against a file's total size.
    ///
    /// End offsets past the file are clamped; a suffix longer than the file
    /// covers the whole file. A span whose start lands at or past the end
    /// of the file (including any range into an empty file) is
    /// unsatisfiable.
    ///
    /// # Errors
    ///
    /// - `RangeError::Unsatisfiable` - If the resolved span is empty
    pub fn resolve(self, total_size: u64) -> Result<ResolvedRange, RangeError> {
        let start = match self {
            RangeSpec::FromOffset(start) => start,
            RangeSpec::Suffix(n) => total_size.saturating_sub(n),
            RangeSpec::Explicit(start, _) => start,
        };
        if start >= total_size {
            return Err(RangeError::Unsatisfiable { total_size });
        }

        let end = match self {
            RangeSpec::FromOffset(_) | RangeSpec::Suffix(_) => total_size - 1,
            RangeSpec::Explicit(_, end) => end.min(total_size - 1),
        };
        if start > end {
            return Err(RangeError::Unsatisfiable { total_size });
        }

        Ok(ResolvedRange {
            start,
            length: end - start + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_explicit_range() {
        assert_eq!(
            parse_range_header("bytes=100-199"),
            Some(RangeSpec::Explicit(100, 199))
        );
    }

    #[test]
    fn test_parse_open_ended_range() {
        assert_eq!(
            parse_range_header("bytes=500-"),
            Some(RangeSpec::FromOffset(500))
        );
    }

    #[test]
    fn test_parse_suffix_range() {
        assert_eq!(parse_range_header("bytes=-256"), Some(RangeSpec::Suffix(256)));
    }

    #[test]
    fn test_parse_bare_specs_cover_full_file() {
        assert_eq!(parse_range_header("bytes="), Some(RangeSpec::FromOffset(0)));
        assert_eq!(parse_range_header("bytes=-"), Some(RangeSpec::FromOffset(0)));
    }

    #[test]
    fn test_parse_rejects_malformed_headers() {
        assert_eq!(parse_range_header("bytes=abc-def"), None);
        assert_eq!(parse_range_header("bytes=10-5,20-30"), None);
        assert_eq!(parse_range_header("items=0-10"), None);
        assert_eq!(parse_range_header(""), None);
    }

    #[test]
    fn test_resolve_explicit_within_bounds() {
        let resolved = RangeSpec::Explicit(100, 199).resolve(1000).unwrap();
        assert_eq!(resolved, ResolvedRange { start: 100, length: 100 });
        assert_eq!(resolved.end(), 199);
    }

    #[test]
    fn test_resolve_clamps_end_to_file() {
        let resolved = RangeSpec::Explicit(900, 5000).resolve(1000).unwrap();
        assert_eq!(resolved, ResolvedRange { start: 900, length: 100 });
        assert_eq!(resolved.end(), 999);
    }

    #[test]
    fn test_resolve_open_ended() {
        let resolved = RangeSpec::FromOffset(250).resolve(1000).unwrap();
        assert_eq!(resolved, ResolvedRange { start: 250, length: 750 });
    }

    #[test]
    fn test_resolve_suffix() {
        let resolved = RangeSpec::Suffix(100).resolve(1000).unwrap();
        assert_eq!(resolved, ResolvedRange { start: 900, length: 100 });
    }

    #[test]
    fn test_resolve_oversized_suffix_covers_whole_file() {
        let resolved = RangeSpec::Suffix(5000).resolve(1000).unwrap();
        assert_eq!(resolved, ResolvedRange { start: 0, length: 1000 });
    }

    #[test]
    fn test_resolve_start_past_end_is_unsatisfiable() {
        assert_eq!(
            RangeSpec::FromOffset(1000).resolve(1000),
            Err(RangeError::Unsatisfiable { total_size: 1000 })
        );
        assert_eq!(
            RangeSpec::Explicit(500, 400).resolve(1000),
            Err(RangeError::Unsatisfiable { total_size: 1000 })
        );
    }

    #[test]
    fn test_resolve_zero_suffix_is_unsatisfiable() {
        assert_eq!(
            RangeSpec::Suffix(0).resolve(1000),
            Err(RangeError::Unsatisfiable { total_size: 1000 })
        );
    }

    #[test]
    fn test_resolve_anything_against_empty_file_is_unsatisfiable() {
        assert!(RangeSpec::FromOffset(0).resolve(0).is_err());
        assert!(RangeSpec::Suffix(10).resolve(0).is_err());
        assert!(RangeSpec::Explicit(0, 10).resolve(0).is_err());
    }

    #[test]
    fn test_full_range_of_empty_file_is_zero_length() {
        let resolved = ResolvedRange::full(0);
        assert_eq!(resolved.length, 0);
    }
}
