//! Splits a source byte stream into fixed-size chunks and computes
//! each chunk's text-safe wire form and digest.
//!
//! The chunker is stateless modulo the source stream: `produce(n)` is
//! one of the protocol's three await points (spec §5) but always
//! returns byte-identical results for the same `n`, since both the
//! source read and the digest are pure functions of the file's
//! content.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};

use crate::error::XferError;
use crate::metadata::FileMetadata;

/// Abstracts the byte source a [`Chunker`] reads from, so the same
/// chunking logic runs against a real file or an in-memory buffer.
#[async_trait::async_trait]
pub trait ChunkSource: Send + Sync {
    /// Read exactly the bytes in `[offset, offset + len)`. `len` may
    /// legitimately be shorter than the nominal chunk size for the
    /// file's final chunk.
    async fn read_range(&self, offset: u64, len: u64) -> Result<Vec<u8>, XferError>;
}

/// An in-memory `ChunkSource`, used by tests and by a Receiver
/// verifying its own reconstructed bytes.
pub struct MemoryChunkSource {
    bytes: Vec<u8>,
}

impl MemoryChunkSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

#[async_trait::async_trait]
impl ChunkSource for MemoryChunkSource {
    async fn read_range(&self, offset: u64, len: u64) -> Result<Vec<u8>, XferError> {
        let start = offset as usize;
        let end = (start + len as usize).min(self.bytes.len());
        Ok(self.bytes[start..end].to_vec())
    }
}

/// A `ChunkSource` backed by a file on disk.
pub struct FileChunkSource {
    path: std::path::PathBuf,
}

impl FileChunkSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ChunkSource for FileChunkSource {
    async fn read_range(&self, offset: u64, len: u64) -> Result<Vec<u8>, XferError> {
        use tokio::io::{AsyncReadExt, AsyncSeekExt};

        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(std::io::SeekFrom::Start(offset)).await?;
        let mut buf = vec![0u8; len as usize];
        file.read_exact(&mut buf).await?;
        Ok(buf)
    }
}

/// The base64 wire form and lowercase-hex SHA-256 digest of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPayload {
    pub wire_form: String,
    pub digest: String,
}

/// Splits a source stream into chunks per [`FileMetadata`] and
/// produces each chunk's wire form and digest on demand.
pub struct Chunker<S: ChunkSource> {
    source: S,
    /// The most recently produced chunk, invalidated on chunk-size
    /// reconfiguration (spec §4.2 — "resets any cached chunk").
    cache: Option<(u64, ChunkPayload)>,
}

impl<S: ChunkSource> Chunker<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: None,
        }
    }

    /// Forget any cached chunk. Called after a chunk-size
    /// reconfiguration, which is only meaningful before the first
    /// envelope is sent.
    pub fn reset_cache(&mut self) {
        self.cache = None;
    }

    /// Produce the wire form and digest for the N-th (1-indexed)
    /// chunk, `1 <= n <= metadata.chunk_count`.
    pub async fn produce(
        &mut self,
        metadata: &FileMetadata,
        n: u64,
    ) -> Result<ChunkPayload, XferError> {
        if let Some((cached_n, payload)) = &self.cache {
            if *cached_n == n {
                return Ok(payload.clone());
            }
        }

        let (start, end) = metadata.chunk_range(n);
        let raw = self.source.read_range(start, end - start).await?;
        let wire_form = BASE64.encode(&raw);
        let digest = digest_wire_form(&wire_form);
        let payload = ChunkPayload { wire_form, digest };

        self.cache = Some((n, payload.clone()));
        Ok(payload)
    }
}

/// The protocol's digest is over the UTF-8 bytes of the base64 wire
/// form text, not over the raw chunk bytes — preserved exactly as a
/// wire-compatibility contract (spec §9).
pub fn digest_wire_form(wire_form: &str) -> String {
    let hash = Sha256::digest(wire_form.as_bytes());
    hex::encode(hash)
}

/// Decode a base64 wire form back to raw bytes.
pub fn decode_wire_form(wire_form: &str) -> Result<Vec<u8>, XferError> {
    BASE64
        .decode(wire_form)
        .map_err(|e| XferError::Encoding(e.to_string()))
}
