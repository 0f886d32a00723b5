//! `lattice-mailbox`: the peer message-exchange primitive.
//!
//! A lock-free, crash-tolerant, single-writer / multi-reader exchange cell
//! over shared memory. Each of up to 31 cooperating processes publishes its
//! single most-recent message into its own region; every other peer locks
//! and reads that message in place. There is no queue: a reader sees either
//! the latest published value or the one it locked before a newer write
//! landed.
//!
//! # Core Components
//!
//! - [`Mailbox`]: the shared slot container — N+1 slots, each guarded by one
//!   32-bit atomic bitmap packing reader-holds bits and the writer mark
//! - [`Outbox`]: creates this process's region and publishes into it
//! - [`Inbox`]: attaches to a peer's region and locks / reads / unlocks
//! - [`PeerId`] / [`PEER_COUNT`]: compile-time group identity
//!
//! # Architecture
//!
//! ```text
//! process 0                 region files               processes 1..N-1
//! ┌──────────┐      ┌───────────────────────────┐      ┌──────────┐
//! │  Outbox  │ ───► │ <prefix>0   (Mailbox<T>)  │ ◄─── │  Inbox   │ × N-1
//! └──────────┘      └───────────────────────────┘      └──────────┘
//! ┌──────────┐      ┌───────────────────────────┐      ┌──────────┐
//! │  Inbox   │ ───► │ <prefix>1   (Mailbox<T>)  │ ◄─── │  Outbox  │ (peer 1)
//! └──────────┘      └───────────────────────────┘      └──────────┘
//!                              ...
//! ```
//!
//! Every process owns exactly one outbox and holds one inbox per other peer.
//!
//! # Crash model
//!
//! Any process may die at any instruction. Nothing quiesces: the surviving
//! writer keeps publishing into free slots, and each process's next
//! incarnation sheds its own stale state on attach ([`Mailbox::reset_reader`]
//! for readers, [`Mailbox::reset_writer`] for the producer). A region is
//! never destroyed by the protocol; removal is administrative.
//!
//! # Example
//!
//! ```ignore
//! use lattice_mailbox::{Inbox, Outbox, PeerId};
//!
//! // Peer 0 publishes...
//! let mut outbox = Outbox::<u64>::create("/tmp/lattice_peer_0")?;
//! outbox.publish(42)?;
//!
//! // ...and peer 1 observes.
//! let me = PeerId::new(1)?;
//! let mut inbox = Inbox::<u64>::attach("/tmp/lattice_peer_0", me, PeerId::new(0)?);
//! if inbox.has_message() {
//!     println!("latest: {}", *inbox.lock()?);
//!     inbox.unlock()?;
//! }
//! ```

mod endpoint;
mod error;
mod mailbox;
mod peer;

pub use endpoint::{Inbox, Outbox};
pub use error::{AttachError, InboxError, InvalidPeerId, MailboxError};
pub use mailbox::{bytes_for_mailbox, Mailbox, SlotHandle, WRITER_BIT};
pub use peer::{PeerId, PEER_COUNT, SLOT_COUNT};
