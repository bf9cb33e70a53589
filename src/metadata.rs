//! File metadata — the immutable record the Sender creates at session
//! start and transmits once to the Receiver as the `meta_info` body.

use serde::{Deserialize, Serialize};

use crate::error::XferError;

/// Default chunk size when the Sender hasn't reconfigured it (64 KiB —
/// matches the teacher protocol's own file-transfer default).
pub const DEFAULT_CHUNK_SIZE: u32 = 64 * 1024;

/// MIME type used when the Sender's file picker can't determine one.
pub const DEFAULT_FILE_TYPE: &str = "application/octet-stream";

/// Immutable file metadata, wire-identical to the `meta_info` body's
/// JSON shape (`fileName`, `fileType`, `fileSize`, `fileChunks`,
/// `chunkSize`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileType")]
    pub file_type: String,
    #[serde(rename = "fileSize")]
    pub file_size: u64,
    #[serde(rename = "chunkSize")]
    pub chunk_size: u32,
    #[serde(rename = "fileChunks")]
    pub chunk_count: u64,
}

impl FileMetadata {
    /// Build metadata for a file of `file_size` bytes, chunked at
    /// `chunk_size`. `chunk_count` is always the unambiguous ceiling
    /// division, 0 only when `file_size == 0`.
    pub fn new(
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        file_size: u64,
        chunk_size: u32,
    ) -> Result<Self, XferError> {
        let file_name = file_name.into();
        let file_type = file_type.into();
        let meta = Self {
            chunk_count: compute_chunk_count(file_size, chunk_size),
            file_name,
            file_type,
            file_size,
            chunk_size,
        };
        meta.validate()?;
        Ok(meta)
    }

    /// Recompute `chunk_count` after a chunk-size reconfiguration.
    /// Only meaningful before the first envelope is sent (spec §4.2) —
    /// callers enforce that freeze, this just keeps the two fields
    /// consistent whenever it's called.
    pub fn reconfigure_chunk_size(&mut self, chunk_size: u32) -> Result<(), XferError> {
        if chunk_size == 0 {
            return Err(XferError::InvalidMetadata(
                "chunk_size must be at least 1",
            ));
        }
        self.chunk_size = chunk_size;
        self.chunk_count = compute_chunk_count(self.file_size, chunk_size);
        Ok(())
    }

    /// Validate invariants: non-empty name, positive chunk size, and a
    /// `chunk_count` consistent with `file_size`/`chunk_size`.
    pub fn validate(&self) -> Result<(), XferError> {
        if self.file_name.trim().is_empty() {
            return Err(XferError::InvalidMetadata("file_name must not be empty"));
        }
        if self.chunk_size == 0 {
            return Err(XferError::InvalidMetadata(
                "chunk_size must be at least 1",
            ));
        }
        if self.chunk_count != compute_chunk_count(self.file_size, self.chunk_size) {
            return Err(XferError::InvalidMetadata(
                "chunk_count is inconsistent with file_size/chunk_size",
            ));
        }
        Ok(())
    }

    /// The byte range `[start, end)` of the source file covered by the
    /// N-th (1-indexed) chunk.
    pub fn chunk_range(&self, n: u64) -> (u64, u64) {
        let start = (n - 1) * self.chunk_size as u64;
        let end = (n * self.chunk_size as u64).min(self.file_size);
        (start, end)
    }

    /// Serialize to the JSON body carried inside a `meta_info` envelope.
    pub fn to_body(&self) -> String {
        serde_json::to_string(self).expect("FileMetadata serializes infallibly")
    }

    /// Parse the `meta_info` envelope body. Returns `None` on malformed
    /// JSON or on metadata that fails [`FileMetadata::validate`] — both
    /// cases leave the Receiver in `AwaitingMeta` with no session
    /// created (spec §7).
    pub fn from_body(body: &str) -> Option<Self> {
        let meta: Self = serde_json::from_str(body).ok()?;
        meta.validate().ok()?;
        Some(meta)
    }
}

/// Unambiguous ceiling division — 0 only when `file_size == 0`.
pub fn compute_chunk_count(file_size: u64, chunk_size: u32) -> u64 {
    if file_size == 0 {
        return 0;
    }
    file_size.div_ceil(chunk_size as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_chunk_count_boundaries() {
        assert_eq!(compute_chunk_count(0, 4), 0);
        assert_eq!(compute_chunk_count(8, 4), 2);
        assert_eq!(compute_chunk_count(9, 4), 3);
        assert_eq!(compute_chunk_count(4, 4), 1);
    }

    #[test]
    fn new_computes_chunk_count() {
        let meta = FileMetadata::new("a.bin", DEFAULT_FILE_TYPE, 8, 4).unwrap();
        assert_eq!(meta.chunk_count, 2);
    }

    #[test]
    fn rejects_empty_name() {
        let err = FileMetadata::new("", DEFAULT_FILE_TYPE, 8, 4).unwrap_err();
        assert!(matches!(err, XferError::InvalidMetadata(_)));
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let err = FileMetadata::new("a.bin", DEFAULT_FILE_TYPE, 8, 0).unwrap_err();
        assert!(matches!(err, XferError::InvalidMetadata(_)));
    }

    #[test]
    fn reconfigure_recomputes_count() {
        let mut meta = FileMetadata::new("a.bin", DEFAULT_FILE_TYPE, 1000, 256).unwrap();
        assert_eq!(meta.chunk_count, 4);
        meta.reconfigure_chunk_size(64).unwrap();
        assert_eq!(meta.chunk_size, 64);
        assert_eq!(meta.chunk_count, 16);
    }

    #[test]
    fn wire_field_names_match_spec() {
        let meta = FileMetadata::new("report.pdf", "application/pdf", 100, 32).unwrap();
        let body = meta.to_body();
        assert!(body.contains("\"fileName\""));
        assert!(body.contains("\"fileType\""));
        assert!(body.contains("\"fileSize\""));
        assert!(body.contains("\"chunkSize\""));
        assert!(body.contains("\"fileChunks\""));
    }

    #[test]
    fn roundtrip_through_body() {
        let meta = FileMetadata::new("report.pdf", "application/pdf", 1_048_576, 65536).unwrap();
        let body = meta.to_body();
        let decoded = FileMetadata::from_body(&body).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn from_body_rejects_inconsistent_chunk_count() {
        let tampered = r#"{"fileName":"a","fileType":"b","fileSize":8,"chunkSize":4,"fileChunks":99}"#;
        assert!(FileMetadata::from_body(tampered).is_none());
    }

    #[test]
    fn chunk_range_last_chunk_is_short() {
        let meta = FileMetadata::new("a.bin", DEFAULT_FILE_TYPE, 9, 4).unwrap();
        assert_eq!(meta.chunk_range(1), (0, 4));
        assert_eq!(meta.chunk_range(2), (4, 8));
        assert_eq!(meta.chunk_range(3), (8, 9));
    }
}
