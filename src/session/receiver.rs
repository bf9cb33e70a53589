//! Receiver-side protocol state machine (spec §4.5).
//!
//! ```text
//! AwaitingMeta ──meta_info──► Collecting ──completed──► Finalized
//!                                  │    ▲
//!                          ok_next │    │ invalid_sha256
//!                                  └────┘
//! ```
//!
//! The critical policy (spec §4.5): `ok_next` always **commits** the
//! prior pending chunk before decoding the new one; `invalid_sha256`
//! **discards** it. This is how the Sender tells the Receiver "drop
//! what you just reported and retry" on a digest mismatch.

use crate::channel::ChannelAdapter;
use crate::envelope::{Envelope, Kind};
use crate::error::XferError;
use crate::mailbox::MailboxReceiver;
use crate::metadata::FileMetadata;
use crate::reassembler::{FileDelivery, Reassembler};

/// The Receiver's current position in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// No metadata observed yet; no reassembler exists.
    AwaitingMeta,
    /// Metadata known; chunks are being staged and committed.
    Collecting,
    /// `completed` observed (or `force_finalize` called); file delivered.
    Finalized,
}

/// Drives the Receiver half of the protocol against a [`ChannelAdapter`]
/// and a [`FileDelivery`] collaborator.
pub struct ReceiverSession<A: ChannelAdapter, D: FileDelivery> {
    channel: A,
    delivery: D,
    metadata: Option<FileMetadata>,
    reassembler: Option<Reassembler>,
    state: ReceiverState,
    nonce: u64,
    last_observed_nonce: Option<u64>,
}

impl<A: ChannelAdapter, D: FileDelivery> ReceiverSession<A, D> {
    pub fn new(channel: A, delivery: D) -> Self {
        Self {
            channel,
            delivery,
            metadata: None,
            reassembler: None,
            state: ReceiverState::AwaitingMeta,
            nonce: 0,
            last_observed_nonce: None,
        }
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    pub fn metadata(&self) -> Option<&FileMetadata> {
        self.metadata.as_ref()
    }

    /// Number of chunks committed so far, or 0 before metadata arrives.
    pub fn committed_count(&self) -> u64 {
        self.reassembler
            .as_ref()
            .map(Reassembler::committed_count)
            .unwrap_or(0)
    }

    /// The file-delivery collaborator, e.g. to inspect a test double's
    /// captured bytes once `state()` is `Finalized`.
    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    fn next_nonce(&mut self) -> u64 {
        self.nonce += 1;
        self.nonce
    }

    fn display(&mut self, kind: Kind, body: impl Into<String>) {
        let nonce = self.next_nonce();
        let envelope = Envelope::new(kind, body, nonce);
        tracing::trace!(?kind, nonce, "receiver displaying envelope");
        self.channel.display(&envelope);
    }

    /// User action: cancel the transfer. No partial file is delivered;
    /// resources are released; the session returns to `AwaitingMeta`.
    pub fn stop(&mut self) {
        self.channel.teardown();
        self.metadata = None;
        self.reassembler = None;
        self.state = ReceiverState::AwaitingMeta;
        tracing::info!("receiver session stopped");
    }

    /// Process one observation from the Sender (spec §4.5). Dedups on
    /// `nonce`; unrecognized kinds and transitions with no row are
    /// no-ops.
    pub async fn on_observed(&mut self, raw: &str) -> Result<(), XferError> {
        let envelope = Envelope::decode(raw);

        if Some(envelope.nonce) == self.last_observed_nonce {
            tracing::trace!(nonce = envelope.nonce, "duplicate observation dropped");
            return Ok(());
        }
        self.last_observed_nonce = Some(envelope.nonce);

        match (self.state, envelope.kind) {
            (ReceiverState::AwaitingMeta, Kind::MetaInfo) => {
                if self.metadata.is_some() {
                    tracing::trace!("meta_info ignored: metadata already set");
                    return Ok(());
                }
                match FileMetadata::from_body(&envelope.body) {
                    Some(meta) => {
                        self.reassembler = Some(Reassembler::new(meta.clone()));
                        self.metadata = Some(meta);
                        self.display(Kind::MetaInfoReceived, "");
                        self.state = ReceiverState::Collecting;
                    }
                    None => {
                        tracing::warn!("meta_info failed validation; staying AwaitingMeta");
                    }
                }
            }
            (ReceiverState::Collecting, Kind::OkNext) => {
                let reassembler = self.reassembler.as_mut().expect("Collecting implies a reassembler");
                if reassembler.has_pending() {
                    reassembler.commit_pending()?;
                }
                let digest = reassembler.set_pending(&envelope.body)?;
                self.display(Kind::EvalSha256, digest);
            }
            (ReceiverState::Collecting, Kind::InvalidSha256) => {
                let reassembler = self.reassembler.as_mut().expect("Collecting implies a reassembler");
                reassembler.drop_pending();
                let digest = reassembler.set_pending(&envelope.body)?;
                self.display(Kind::EvalSha256, digest);
            }
            (ReceiverState::Collecting, Kind::Completed) => {
                let reassembler = self.reassembler.as_mut().expect("Collecting implies a reassembler");
                if reassembler.has_pending() {
                    reassembler.commit_pending()?;
                }
                reassembler.finalize(&mut self.delivery).await?;
                self.channel.teardown();
                self.state = ReceiverState::Finalized;
                tracing::info!("receiver session finalized");
            }
            (state, kind) => {
                tracing::trace!(?state, ?kind, "observation ignored: no transition");
            }
        }
        Ok(())
    }

    /// Manual-finish fallback for a missed `completed` envelope (spec
    /// §9, §4.4's "open robustness issue"). Commits any staged pending
    /// chunk and finalizes immediately — callers should only invoke
    /// this once they are convinced every chunk has already arrived;
    /// invoking it early finalizes a short file.
    pub async fn force_finalize(&mut self) -> Result<(), XferError> {
        let reassembler = self.reassembler.as_mut().ok_or(XferError::SessionClosed)?;
        if reassembler.has_pending() {
            reassembler.commit_pending()?;
        }
        reassembler.finalize(&mut self.delivery).await?;
        self.channel.teardown();
        self.state = ReceiverState::Finalized;
        tracing::warn!("receiver session force-finalized (missed `completed`)");
        Ok(())
    }

    /// Drive the mailbox loop: process observations strictly in arrival
    /// order until the mailbox's senders are all dropped (spec §5).
    pub async fn run(&mut self, mailbox: &mut MailboxReceiver<String>) -> Result<(), XferError> {
        while let Some(raw) = mailbox.next().await {
            self.on_observed(&raw).await?;
            if self.state == ReceiverState::Finalized {
                break;
            }
        }
        Ok(())
    }
}
