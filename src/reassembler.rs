//! Collects chunks observed by the Receiver, in order, and produces
//! the reconstructed file.

use crate::chunker::{decode_wire_form, digest_wire_form};
use crate::error::XferError;
use crate::metadata::FileMetadata;

/// The Receiver's external file-delivery collaborator — the in-process
/// analogue of handing a blob to the browser's download machinery.
#[async_trait::async_trait]
pub trait FileDelivery: Send + Sync {
    async fn deliver(
        &mut self,
        file_name: &str,
        file_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), XferError>;
}

/// A `FileDelivery` test double that captures the delivered bytes.
#[derive(Default)]
pub struct MemoryFileDelivery {
    pub delivered: Option<(String, String, Vec<u8>)>,
}

#[async_trait::async_trait]
impl FileDelivery for MemoryFileDelivery {
    async fn deliver(
        &mut self,
        file_name: &str,
        file_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), XferError> {
        self.delivered = Some((file_name.to_string(), file_type.to_string(), bytes));
        Ok(())
    }
}

/// A single pending chunk: its decoded raw bytes, staged until the
/// Sender's next envelope tells us whether to commit or drop it.
struct Pending {
    raw: Vec<u8>,
}

/// Accumulates committed chunks in order and finalizes the file.
///
/// Invariant 1 (spec §3): the committed buffer is always a strict,
/// gapless, in-order prefix of the file's chunk sequence — enforced
/// here by only ever appending, never inserting.
pub struct Reassembler {
    metadata: FileMetadata,
    committed: Vec<Vec<u8>>,
    committed_len: u64,
    pending: Option<Pending>,
    closed: bool,
}

impl Reassembler {
    pub fn new(metadata: FileMetadata) -> Self {
        Self {
            metadata,
            committed: Vec::new(),
            committed_len: 0,
            pending: None,
            closed: false,
        }
    }

    /// Number of chunks committed so far.
    pub fn committed_count(&self) -> u64 {
        self.committed.len() as u64
    }

    /// Decode `wire_form`, stage it in the single pending slot
    /// (overwriting, never queuing — invariant 3), and return its
    /// digest for the Receiver to report back.
    pub fn set_pending(&mut self, wire_form: &str) -> Result<String, XferError> {
        if self.closed {
            return Err(XferError::SessionClosed);
        }
        let raw = decode_wire_form(wire_form)?;
        let digest = digest_wire_form(wire_form);
        self.pending = Some(Pending { raw });
        Ok(digest)
    }

    /// Discard the pending chunk without committing it (the Sender
    /// has rejected the digest we reported and is retrying).
    pub fn drop_pending(&mut self) {
        self.pending = None;
    }

    /// Append the pending chunk to the committed buffer. A no-op if
    /// there is no pending chunk (callers check before calling, but
    /// this stays safe either way).
    pub fn commit_pending(&mut self) -> Result<(), XferError> {
        if self.closed {
            return Err(XferError::SessionClosed);
        }
        if let Some(pending) = self.pending.take() {
            let new_len = self.committed_len + pending.raw.len() as u64;
            if new_len > self.metadata.file_size {
                return Err(XferError::ReassemblyOverflow);
            }
            self.committed_len = new_len;
            self.committed.push(pending.raw);
        }
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Concatenate every committed chunk and hand the result to the
    /// `FileDelivery` collaborator. Further operations after this
    /// fail with `SessionClosed`.
    pub async fn finalize(
        &mut self,
        delivery: &mut dyn FileDelivery,
    ) -> Result<Vec<u8>, XferError> {
        if self.closed {
            return Err(XferError::SessionClosed);
        }
        self.closed = true;

        let mut bytes = Vec::with_capacity(self.committed_len as usize);
        for chunk in &self.committed {
            bytes.extend_from_slice(chunk);
        }

        delivery
            .deliver(&self.metadata.file_name, &self.metadata.file_type, bytes.clone())
            .await?;

        Ok(bytes)
    }
}
