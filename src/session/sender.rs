//! Sender-side protocol state machine (spec §4.4).
//!
//! ```text
//! Idle ──start──► Advertising ──meta_info_received──► Transmitting(1)
//!                                                         │
//!                          eval_sha256 matches, N<count   │ eval_sha256 matches, N==count
//!                          ┌──────────────────────────────┤
//!                          ▼                              ▼
//!                   Transmitting(N+1)                 Finalizing ──(grace)──► Done
//!                          ▲
//!                          │ eval_sha256 mismatches (same chunk redisplayed)
//!                          └──────────────────────────────┘
//! ```
//!
//! `stop()` tears down from any state back to `Idle`.

use tokio_util::sync::CancellationToken;

use crate::chunker::{ChunkSource, Chunker};
use crate::config::SessionConfig;
use crate::channel::ChannelAdapter;
use crate::envelope::{Envelope, Kind};
use crate::error::XferError;
use crate::mailbox::MailboxReceiver;
use crate::metadata::FileMetadata;

/// The Sender's current position in the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderState {
    /// No transfer in progress.
    Idle,
    /// `meta_info` is on the wire; awaiting `meta_info_received`.
    Advertising,
    /// Chunk `n`'s wire form (cached alongside its digest for
    /// identical retransmission on a digest mismatch) is on the wire.
    Transmitting { n: u64, wire_form: String, digest: String },
    /// `completed` is on the wire; holding for the grace window.
    Finalizing,
    /// Session torn down after a full, acknowledged transfer.
    Done,
}

/// Drives the Sender half of the protocol against a [`ChunkSource`] and
/// a [`ChannelAdapter`].
pub struct SenderSession<S: ChunkSource, A: ChannelAdapter> {
    metadata: FileMetadata,
    chunker: Chunker<S>,
    channel: A,
    config: SessionConfig,
    state: SenderState,
    nonce: u64,
    last_observed_nonce: Option<u64>,
    cancel: CancellationToken,
}

impl<S: ChunkSource, A: ChannelAdapter> SenderSession<S, A> {
    pub fn new(metadata: FileMetadata, source: S, channel: A, config: SessionConfig) -> Self {
        Self {
            metadata,
            chunker: Chunker::new(source),
            channel,
            config,
            state: SenderState::Idle,
            nonce: 0,
            last_observed_nonce: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> &SenderState {
        &self.state
    }

    /// Reconfigure the chunk size. Only meaningful in `Idle`, before
    /// the first envelope is displayed (spec §4.2).
    pub fn reconfigure_chunk_size(&mut self, chunk_size: u32) -> Result<(), XferError> {
        if self.state != SenderState::Idle {
            return Err(XferError::InvalidMetadata(
                "chunk_size is frozen once the first envelope has been sent",
            ));
        }
        self.metadata.reconfigure_chunk_size(chunk_size)?;
        self.chunker.reset_cache();
        self.config.chunk_size = chunk_size;
        Ok(())
    }

    fn next_nonce(&mut self) -> u64 {
        self.nonce += 1;
        self.nonce
    }

    fn display(&mut self, kind: Kind, body: impl Into<String>) {
        let nonce = self.next_nonce();
        let envelope = Envelope::new(kind, body, nonce);
        tracing::trace!(?kind, nonce, "sender displaying envelope");
        self.channel.display(&envelope);
    }

    /// User action: begin the transfer by advertising the file's
    /// metadata. Valid only from `Idle`.
    pub fn start(&mut self) {
        if self.state != SenderState::Idle {
            tracing::trace!(state = ?self.state, "start ignored: not Idle");
            return;
        }
        let body = self.metadata.to_body();
        self.display(Kind::MetaInfo, body);
        self.state = SenderState::Advertising;
    }

    /// User action: cancel the transfer. Tears down resources and
    /// discards any in-flight chunk I/O/digest work (spec §5).
    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.channel.teardown();
        self.state = SenderState::Idle;
        tracing::info!("sender session stopped");
    }

    /// Process one observation from the Receiver. Dedups on `nonce`
    /// (spec invariant 5), then applies the transition table in spec
    /// §4.4. Unrecognized kinds and transitions with no row are no-ops.
    pub async fn on_observed(&mut self, raw: &str) -> Result<(), XferError> {
        let envelope = Envelope::decode(raw);

        if Some(envelope.nonce) == self.last_observed_nonce {
            tracing::trace!(nonce = envelope.nonce, "duplicate observation dropped");
            return Ok(());
        }
        self.last_observed_nonce = Some(envelope.nonce);

        match (self.state.clone(), envelope.kind) {
            (SenderState::Advertising, Kind::MetaInfoReceived) => {
                if self.metadata.chunk_count == 0 {
                    self.display(Kind::Completed, "");
                    self.state = SenderState::Finalizing;
                    self.hold_and_finish().await;
                } else {
                    self.advance_to_chunk(1).await?;
                }
            }
            (SenderState::Transmitting { n, digest, wire_form }, Kind::EvalSha256) => {
                if envelope.body == digest {
                    if n < self.metadata.chunk_count {
                        self.advance_to_chunk(n + 1).await?;
                    } else {
                        self.display(Kind::Completed, "");
                        self.state = SenderState::Finalizing;
                        self.hold_and_finish().await;
                    }
                } else {
                    tracing::warn!(n, "digest mismatch, retransmitting chunk");
                    self.display(Kind::InvalidSha256, wire_form.clone());
                    self.state = SenderState::Transmitting { n, wire_form, digest };
                }
            }
            (state, kind) => {
                tracing::trace!(?state, ?kind, "observation ignored: no transition");
            }
        }
        Ok(())
    }

    async fn advance_to_chunk(&mut self, n: u64) -> Result<(), XferError> {
        let produce = self.chunker.produce(&self.metadata, n);
        let payload = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!("chunk produce cancelled by stop()");
                return Ok(());
            }
            result = produce => result?,
        };
        self.display(Kind::OkNext, payload.wire_form.clone());
        self.state = SenderState::Transmitting {
            n,
            wire_form: payload.wire_form,
            digest: payload.digest,
        };
        Ok(())
    }

    /// The ~2s `Finalizing` grace window (spec §4.4), then teardown.
    /// Cancellable by `stop()`.
    async fn hold_and_finish(&mut self) {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!("finalizing grace window cancelled by stop()");
                return;
            }
            _ = tokio::time::sleep(self.config.finalize_grace()) => {}
        }
        self.channel.teardown();
        self.state = SenderState::Done;
        tracing::info!("sender session done");
    }

    /// Drive the mailbox loop: process observations strictly in arrival
    /// order until the mailbox's senders are all dropped (spec §5).
    pub async fn run(&mut self, mailbox: &mut MailboxReceiver<String>) -> Result<(), XferError> {
        while let Some(raw) = mailbox.next().await {
            self.on_observed(&raw).await?;
            if self.state == SenderState::Done {
                break;
            }
        }
        Ok(())
    }
}
