//! The byte source: turns a file on disk into a fully-buffered, seekable
//! cursor over the *decompressed* bytes, auto-detecting whether the file is
//! gzip-framed or raw.
//!
//! QSH recordings are bounded historical logs rather than unbounded live
//! feeds, so buffering the whole decompressed stream up front is the right
//! trade: `tell`/`seek` become exact and O(1), and the detection logic below
//! is testable without touching the filesystem at all.

use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{Error, Result};

/// Signature bytes every QSH stream must begin with.
pub const SIGNATURE: &[u8] = b"QScalp History Data";

/// A seekable cursor over the decompressed QSH byte stream.
pub type Source = std::io::Cursor<Vec<u8>>;

/// Reads `path` from disk and returns a [`Source`] positioned at byte 0,
/// trying gzip framing first and falling back to raw bytes.
pub fn open(path: impl AsRef<Path>) -> Result<Source> {
    let raw = std::fs::read(path)?;
    from_bytes(raw)
}

/// Builds a [`Source`] from an in-memory byte buffer, applying the same
/// gzip-then-raw detection policy as [`open`]. Exposed separately so the
/// detection policy can be unit tested without touching the filesystem.
pub fn from_bytes(raw: Vec<u8>) -> Result<Source> {
    if let Some(decompressed) = try_gunzip(&raw) {
        if starts_with_signature(&decompressed) {
            tracing::debug!(bytes = decompressed.len(), "opened gzip-framed QSH stream");
            return Ok(std::io::Cursor::new(decompressed));
        }
    }

    if starts_with_signature(&raw) {
        tracing::debug!(bytes = raw.len(), "opened raw QSH stream");
        return Ok(std::io::Cursor::new(raw));
    }

    Err(Error::UnsupportedFormat)
}

fn starts_with_signature(bytes: &[u8]) -> bool {
    bytes.len() >= SIGNATURE.len() && &bytes[..SIGNATURE.len()] == SIGNATURE
}

/// Attempts a full gzip decompression; returns `None` on any failure so the
/// caller can fall back to treating the bytes as raw instead of failing
/// outright (a non-gzip file is not itself an error until the signature
/// check also fails).
fn try_gunzip(raw: &[u8]) -> Option<Vec<u8>> {
    let mut decoder = GzDecoder::new(raw);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn header_only_bytes() -> Vec<u8> {
        let mut bytes = SIGNATURE.to_vec();
        bytes.push(1); // version
        bytes.push(0); // empty application string
        bytes.push(0); // empty comment string
        bytes.extend_from_slice(&0i64.to_le_bytes()); // created_at
        bytes.push(0); // streams_count
        bytes
    }

    #[test]
    fn detects_raw_stream() {
        let raw = header_only_bytes();
        let source = from_bytes(raw.clone()).unwrap();
        assert_eq!(source.into_inner(), raw);
    }

    #[test]
    fn detects_gzip_stream() {
        let raw = header_only_bytes();
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&raw).unwrap();
        let gzipped = encoder.finish().unwrap();

        let source = from_bytes(gzipped).unwrap();
        assert_eq!(source.into_inner(), raw);
    }

    #[test]
    fn rejects_bad_signature() {
        let err = from_bytes(b"not a qsh file at all".to_vec()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat));
    }
}
