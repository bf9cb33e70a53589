//! A single-slot, overwrite-semantics observation queue (spec §5).
//!
//! When a new observation arrives while the session is still
//! processing the last one, the protocol tolerates losing the stale
//! observation — the peer will keep redisplaying the same envelope
//! until it sees the expected response. `tokio::sync::watch` already
//! has exactly this "newest value wins, no queueing" behavior, so the
//! mailbox is a thin, purpose-named wrapper around it rather than a
//! bespoke data structure.

use tokio::sync::watch;

/// Producer handle. Cheaply cloneable; typically owned by the
/// `ChannelAdapter` implementation's capture callback.
#[derive(Clone)]
pub struct MailboxSender<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> MailboxSender<T> {
    /// Publish a fresh observation, overwriting any value the session
    /// hasn't yet consumed.
    pub fn post(&self, value: T) {
        let _ = self.tx.send(Some(value));
    }
}

/// Consumer handle, owned by the session's drive loop.
pub struct MailboxReceiver<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> MailboxReceiver<T> {
    /// Wait for the next observation distinct from the last one this
    /// receiver returned. Returns `None` once every sender has been
    /// dropped — the signal to stop the drive loop.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            if let Some(value) = self.rx.borrow_and_update().clone() {
                return Some(value);
            }
        }
    }
}

/// Create a single-slot mailbox pair.
pub fn mailbox<T: Clone>() -> (MailboxSender<T>, MailboxReceiver<T>) {
    let (tx, rx) = watch::channel(None);
    (MailboxSender { tx }, MailboxReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_posted_values_in_order_when_consumed_promptly() {
        let (tx, mut rx) = mailbox::<u32>();
        tx.post(1);
        assert_eq!(rx.next().await, Some(1));
        tx.post(2);
        assert_eq!(rx.next().await, Some(2));
    }

    #[tokio::test]
    async fn overwrites_unread_value() {
        let (tx, mut rx) = mailbox::<u32>();
        tx.post(1);
        tx.post(2); // 1 is overwritten before being read
        assert_eq!(rx.next().await, Some(2));
    }

    #[tokio::test]
    async fn returns_none_once_sender_dropped() {
        let (tx, mut rx) = mailbox::<u32>();
        drop(tx);
        assert_eq!(rx.next().await, None);
    }
}
