//! The thin interface to the external display/capture collaborator
//! (QR rendering + camera capture). Everything about frame-sampling
//! cadence, pixel geometry, or QR error-correction level lives on the
//! other side of this trait (spec §4.6).

use crate::envelope::Envelope;

/// Implemented by the peripheral layer that renders envelopes as QR
/// images and feeds back decoded observations. `display` must be
/// idempotent — calling it repeatedly with the same envelope renders
/// the same image, so a caller can safely redisplay after a digest
/// mismatch without worrying about visible flicker semantics.
///
/// `on_observed` is deliberately *not* part of this trait: it is the
/// session's own entry point (`SenderSession::on_observed`,
/// `ReceiverSession::on_observed`), which the adapter calls every time
/// its capture subsystem decodes an envelope — including repeat
/// sightings of an unchanged image.
pub trait ChannelAdapter: Send {
    /// Render `envelope` as the currently displayed image.
    fn display(&mut self, envelope: &Envelope);

    /// Release capture/display resources. Called on every exit path —
    /// normal completion, cancel, or fatal error (spec §5's scoped
    /// resource acquisition rule). Default no-op for test doubles that
    /// hold nothing to release.
    fn teardown(&mut self) {}
}

/// A `ChannelAdapter` test double that records every envelope it was
/// asked to display, and whether it has been torn down.
#[derive(Default)]
pub struct RecordingChannel {
    pub displayed: Vec<Envelope>,
    pub torn_down: bool,
}

impl RecordingChannel {
    pub fn last(&self) -> Option<&Envelope> {
        self.displayed.last()
    }
}

impl ChannelAdapter for RecordingChannel {
    fn display(&mut self, envelope: &Envelope) {
        self.displayed.push(envelope.clone());
    }

    fn teardown(&mut self) {
        self.torn_down = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Kind;

    #[test]
    fn recording_channel_captures_displays_and_teardown() {
        let mut channel = RecordingChannel::default();
        channel.display(&Envelope::new(Kind::Completed, "", 1));
        channel.teardown();

        assert_eq!(channel.displayed.len(), 1);
        assert!(channel.torn_down);
        assert_eq!(channel.last().unwrap().kind, Kind::Completed);
    }
}
