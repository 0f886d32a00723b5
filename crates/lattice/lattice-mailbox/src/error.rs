use crate::peer::PeerId;
use std::io;
use std::path::PathBuf;

/// A peer index outside `0 .. PEER_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("peer index {0} is out of range for this exchange group")]
pub struct InvalidPeerId(pub usize);

/// Contract violations surfaced by the mailbox itself.
///
/// None of these are recoverable runtime conditions: each one means a caller
/// broke the exchange protocol. The lock-free fast path never produces an
/// error of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MailboxError {
    #[error("cannot lock a mailbox that has never been published to")]
    Empty,

    #[error("peer {peer} already holds a lock on slot {slot}")]
    AlreadyLocked { peer: PeerId, slot: usize },

    #[error("peer {peer} does not hold a lock on slot {slot}")]
    NotHeld { peer: PeerId, slot: usize },

    #[error("no free slot to publish into; some peer holds more than one lock")]
    NoFreeSlot,
}

/// Failures while binding an endpoint to a region file.
#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("failed to map region '{path}'")]
    Map {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("region '{path}' is {actual} bytes, expected {expected}")]
    SizeMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
}

/// Misuse of an [`Inbox`](crate::Inbox) handle.
///
/// The inbox enforces the one-lock-per-process rule the slot sizing depends
/// on, so double locks and spurious unlocks are caught here before they ever
/// reach the shared words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InboxError {
    #[error("a message is already locked on this inbox")]
    LockHeld,

    #[error("no message is locked on this inbox")]
    NoLockHeld,

    #[error(transparent)]
    Mailbox(#[from] MailboxError),
}
