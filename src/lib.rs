//! # qrxfer-core
//!
//! Core protocol library for transferring an arbitrary binary file
//! between two devices that share no network link, by encoding
//! application-level messages into QR images rendered on each device's
//! display and recovered from the other device's camera.
//!
//! This crate contains:
//! - **Envelope codec** (`envelope`): the typed control frame carried by
//!   every QR image on the visual channel.
//! - **Chunker** (`chunker`): splits a source file into fixed-size
//!   chunks and computes each chunk's text-safe wire form and digest.
//! - **Reassembler** (`reassembler`): collects the Receiver's committed
//!   chunks and produces the reconstructed file.
//! - **Metadata** (`metadata`): the immutable file-metadata record
//!   transmitted once at session start.
//! - **Session** (`session`): the Sender and Receiver state machines
//!   that drive the half-duplex, stop-and-wait protocol.
//! - **Channel adapter** (`channel`): the thin interface to the
//!   external display/capture collaborator.
//! - **Mailbox** (`mailbox`): the single-slot, overwrite-semantics
//!   observation queue each session's drive loop consumes.
//! - **Config** (`config`): the chunk-size and finalize-grace tunables,
//!   TOML-loadable with default fallback.
//! - **Error** (`error`): `XferError` — typed, `thiserror`-based error
//!   hierarchy for the protocol's genuinely fatal situations.

pub mod channel;
pub mod chunker;
pub mod config;
pub mod envelope;
pub mod error;
pub mod mailbox;
pub mod metadata;
pub mod reassembler;
pub mod session;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use channel::{ChannelAdapter, RecordingChannel};
pub use chunker::{ChunkPayload, ChunkSource, Chunker, FileChunkSource, MemoryChunkSource};
pub use config::SessionConfig;
pub use envelope::{Envelope, Kind};
pub use error::XferError;
pub use mailbox::{mailbox, MailboxReceiver, MailboxSender};
pub use metadata::FileMetadata;
pub use reassembler::{FileDelivery, MemoryFileDelivery, Reassembler};
pub use session::{ReceiverSession, ReceiverState, SenderSession, SenderState};
