#![forbid(unsafe_code)]

//! `lattice-events`: payload types exchanged between lattice peers.
//!
//! Every type here crosses a process boundary as raw bytes inside a shared
//! memory region, so all of them are fixed-size `#[repr(C)]` plain old data.
//! Peers are always built from the same source on the same machine; the only
//! compatibility check at runtime is the region size comparison performed by
//! the mailbox endpoints.

pub mod peer_update;

pub use peer_update::PeerUpdate;
