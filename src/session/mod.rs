//! The two peer state machines that drive the protocol (spec §4.4,
//! §4.5): [`sender::SenderSession`] and [`receiver::ReceiverSession`].

pub mod receiver;
pub mod sender;

pub use receiver::{ReceiverSession, ReceiverState};
pub use sender::{SenderSession, SenderState};
