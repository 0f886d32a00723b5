//! Producer and consumer endpoints binding a [`Mailbox`] to a region file.
//!
//! An [`Outbox`] creates (or reopens after a crash) the region this process
//! owns and is the only place `publish` is called from. An [`Inbox`] maps a
//! peer's region and enforces the one-outstanding-lock rule the slot sizing
//! depends on. Both run their crash-recovery reset once on attach, before
//! any other operation touches the shared words.

use std::marker::PhantomData;
use std::path::Path;
use std::thread;
use std::time::Duration;

use lattice_shm::ShmFileMut;

use crate::error::{AttachError, InboxError, MailboxError};
use crate::mailbox::{bytes_for_mailbox, Mailbox, SlotHandle};
use crate::peer::PeerId;

/// Pause between attach retries while waiting for a peer to create its
/// region. The rendezvous is polling by design; the sleep just keeps the
/// wait off the CPU.
const ATTACH_RETRY_DELAY: Duration = Duration::from_millis(1);

/// The writing end of this process's own region.
///
/// Exclusive producer: no other process may call writer operations on the
/// region. That is an assumption of the naming scheme (each index maps to
/// exactly one region its owner creates), not something the mailbox checks.
pub struct Outbox<T: Copy> {
    /// Owns the mapping lifetime; not accessed after init.
    _region: ShmFileMut,
    /// Start of the mapped region, where the mailbox lives.
    base: *mut u8,
    _pd: PhantomData<T>,
}

unsafe impl<T: Copy + Send> Send for Outbox<T> {}

impl<T: Copy> Outbox<T> {
    /// Creates this process's region if absent, reopens it untouched if
    /// present, and repairs any in-flight publish a previous incarnation
    /// left behind.
    ///
    /// A fresh region is zero-filled, which is exactly the empty-mailbox
    /// image, so no constructor runs in either case.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, AttachError> {
        let path = path.as_ref();
        let expected = bytes_for_mailbox::<T>();
        let mut region =
            ShmFileMut::create_or_open(path, expected as u64).map_err(|source| AttachError::Map {
                path: path.to_path_buf(),
                source,
            })?;
        if region.len() != expected {
            return Err(AttachError::SizeMismatch {
                path: path.to_path_buf(),
                expected,
                actual: region.len(),
            });
        }

        let base = region.as_mut_ptr();
        let outbox = Self {
            _region: region,
            base,
            _pd: PhantomData,
        };
        outbox.mailbox().reset_writer();
        Ok(outbox)
    }

    #[inline]
    fn mailbox(&self) -> &Mailbox<T> {
        // SAFETY: base points at a mapping of at least bytes_for_mailbox::<T>()
        // bytes whose zero image is a valid mailbox; create() verified the size.
        unsafe { &*(self.base as *const Mailbox<T>) }
    }

    /// Publishes `update` as this peer's most recent message.
    pub fn publish(&mut self, update: T) -> Result<(), MailboxError> {
        self.mailbox().publish(update)
    }
}

/// The reading end of one peer's region.
///
/// Holds at most one lock at a time; [`lock`](Self::lock) and
/// [`unlock`](Self::unlock) must alternate. A crashed reader's bits are shed
/// by the reset its next incarnation runs on attach — there is no unlock on
/// drop, matching what a crash would leave behind.
pub struct Inbox<T: Copy> {
    /// Owns the mapping lifetime; not accessed after init.
    _region: ShmFileMut,
    base: *mut u8,
    /// This process's index: the bit it sets when locking.
    reader: PeerId,
    /// The peer whose region this is.
    source: PeerId,
    /// Outstanding lock, if any.
    locked: Option<SlotHandle>,
    _pd: PhantomData<T>,
}

unsafe impl<T: Copy + Send> Send for Inbox<T> {}

impl<T: Copy> Inbox<T> {
    /// Binds to `source`'s region, failing if it does not exist yet or has
    /// the wrong size for `T`. Sheds any locks this process's previous
    /// incarnation left on the region.
    pub fn try_attach<P: AsRef<Path>>(
        path: P,
        reader: PeerId,
        source: PeerId,
    ) -> Result<Self, AttachError> {
        let path = path.as_ref();
        let expected = bytes_for_mailbox::<T>();
        let mut region = ShmFileMut::open_rw(path).map_err(|err| AttachError::Map {
            path: path.to_path_buf(),
            source: err,
        })?;
        if region.len() != expected {
            return Err(AttachError::SizeMismatch {
                path: path.to_path_buf(),
                expected,
                actual: region.len(),
            });
        }

        let base = region.as_mut_ptr();
        let inbox = Self {
            _region: region,
            base,
            reader,
            source,
            locked: None,
            _pd: PhantomData,
        };
        inbox.mailbox().reset_reader(reader);
        Ok(inbox)
    }

    /// The rendezvous: retries [`try_attach`](Self::try_attach) until the
    /// producer has created a well-formed region. Producers create their own
    /// region before attaching to anyone else's, so the wait is bounded by
    /// peer startup, not by protocol state.
    pub fn attach<P: AsRef<Path>>(path: P, reader: PeerId, source: PeerId) -> Self {
        let path = path.as_ref();
        loop {
            match Self::try_attach(path, reader, source) {
                Ok(inbox) => return inbox,
                Err(_) => thread::sleep(ATTACH_RETRY_DELAY),
            }
        }
    }

    #[inline]
    fn mailbox(&self) -> &Mailbox<T> {
        // SAFETY: same mapping argument as Outbox::mailbox; try_attach
        // verified the region size.
        unsafe { &*(self.base as *const Mailbox<T>) }
    }

    /// The peer whose output this inbox observes.
    #[inline]
    pub fn source(&self) -> PeerId {
        self.source
    }

    /// True once the source peer has published at least once.
    #[inline]
    pub fn has_message(&self) -> bool {
        !self.mailbox().is_empty()
    }

    /// Locks the source's latest message and borrows it until
    /// [`unlock`](Self::unlock).
    pub fn lock(&mut self) -> Result<&T, InboxError> {
        if self.locked.is_some() {
            return Err(InboxError::LockHeld);
        }
        let handle = self.mailbox().lock(self.reader)?;
        self.locked = Some(handle);
        // SAFETY: the handle was just acquired and is only forgotten by
        // unlock(), which ends the borrow handed out here.
        Ok(unsafe { self.mailbox().message(handle) })
    }

    /// Releases the outstanding lock.
    pub fn unlock(&mut self) -> Result<(), InboxError> {
        let handle = self.locked.take().ok_or(InboxError::NoLockHeld)?;
        self.mailbox().unlock(self.reader, handle)?;
        Ok(())
    }
}
