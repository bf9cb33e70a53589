//! The envelope carried by every QR image on the visual channel.
//!
//! # Wire form
//!
//! A compact JSON object with three fields:
//!
//! ```text
//! {"kind_id": <u8>, "body": <string>, "nonce": <u64>}
//! ```
//!
//! Encoding is deterministic. Decoding is total: malformed payloads,
//! payloads missing a field, and payloads carrying an unrecognized
//! `kind_id` all decode to [`Kind::Unknown`] rather than failing, so
//! both state machines can treat "observed something we don't
//! understand" as a single, silent no-op case.

use serde::{Deserialize, Serialize};

/// The seven message kinds the protocol defines on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Kind {
    /// S → R. File metadata, sent once at session start.
    MetaInfo = 0,
    /// R → S. Acknowledges receipt of `meta_info`. Empty body.
    MetaInfoReceived = 1,
    /// S → R. The next chunk's wire form (base64).
    OkNext = 2,
    /// R → S. Hex SHA-256 digest of the last received chunk's wire form.
    EvalSha256 = 3,
    /// S → R. Retransmission of the chunk just rejected — same wire form.
    InvalidSha256 = 4,
    /// S → R. Terminal envelope. Empty body.
    Completed = 50,
    /// Reserved. Never emitted; the decode target for anything we
    /// can't otherwise parse or don't recognize.
    Unknown = 100,
}

impl Kind {
    fn from_id(id: u8) -> Self {
        match id {
            0 => Kind::MetaInfo,
            1 => Kind::MetaInfoReceived,
            2 => Kind::OkNext,
            3 => Kind::EvalSha256,
            4 => Kind::InvalidSha256,
            50 => Kind::Completed,
            _ => Kind::Unknown,
        }
    }

    fn id(self) -> u8 {
        self as u8
    }
}

/// One protocol message — the content of one QR image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub kind: Kind,
    pub body: String,
    pub nonce: u64,
}

/// Plain serde mirror of the wire JSON shape. Kept separate from
/// [`Envelope`] so a missing field fails `serde_json` cleanly (all
/// fields required, no defaults) rather than silently zeroing it —
/// the "missing field" case is handled explicitly by `decode`.
#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    kind_id: u8,
    body: String,
    nonce: u64,
}

impl Envelope {
    pub fn new(kind: Kind, body: impl Into<String>, nonce: u64) -> Self {
        Self {
            kind,
            body: body.into(),
            nonce,
        }
    }

    /// The envelope mapped to by any unparseable or unrecognized input.
    pub fn unknown() -> Self {
        Self {
            kind: Kind::Unknown,
            body: String::new(),
            nonce: 0,
        }
    }

    /// Serialize to the JSON-shaped wire string, trimming `body`.
    pub fn encode(&self) -> String {
        let wire = WireEnvelope {
            kind_id: self.kind.id(),
            body: self.body.trim().to_string(),
            nonce: self.nonce,
        };
        serde_json::to_string(&wire).expect("WireEnvelope serializes infallibly")
    }

    /// Deserialize from a wire string. Total — never fails.
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<WireEnvelope>(raw) {
            Ok(wire) => Self {
                kind: Kind::from_id(wire.kind_id),
                body: wire.body.trim().to_string(),
                nonce: wire.nonce,
            },
            Err(_) => Self::unknown(),
        }
    }
}
