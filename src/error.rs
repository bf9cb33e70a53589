//! Domain-specific error types for the QR file-transfer protocol.
//!
//! All fallible operations return `Result<T, XferError>`. Malformed
//! *observations* are never an error here — the envelope codec and the
//! state machines absorb those silently (spec §7) — only genuinely
//! fatal situations reach this type.

use thiserror::Error;

/// The canonical error type for the transfer protocol.
#[derive(Debug, Error)]
pub enum XferError {
    /// Metadata failed validation (empty name, non-positive chunk size,
    /// or a `chunk_count` inconsistent with `file_size`/`chunk_size`).
    /// The Receiver stays in `AwaitingMeta`; no session is created.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(&'static str),

    /// A reassembler or chunker operation was attempted after
    /// `finalize()` already closed the session.
    #[error("session already closed")]
    SessionClosed,

    /// Concatenating committed chunks would exceed the declared
    /// `file_size`. Fatal — the session aborts.
    #[error("reassembly overflow: committed bytes exceed declared file size")]
    ReassemblyOverflow,

    /// A syntactically valid envelope carried a `body` that could not
    /// be base64-decoded. Unlike a malformed envelope (silently
    /// ignored), this is fatal: the protocol has no chunk-level retry
    /// path other than the Sender's own `invalid_sha256`.
    #[error("malformed chunk wire form: {0}")]
    Encoding(String),

    /// The display/capture collaborator reported its device
    /// unavailable. The core tears down to its idle state.
    #[error("channel adapter unavailable: {0}")]
    ChannelUnavailable(String),

    /// The chunk source could not be read.
    #[error("chunk source I/O error: {0}")]
    Io(#[from] std::io::Error),
}
