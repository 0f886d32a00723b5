//! The shared slot container.
//!
//! A `Mailbox<T>` lives entirely inside a shared memory region and holds one
//! peer's most recently published value. Its layout is the region layout:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  current_slot_id (32-bit atomic, one-based; 0 = never written) │
//! ├────────────────────────────────────────────────────────────────┤
//! │  Slot[0]                                                       │
//! │  ┌─────────────────────────┬────────────────────────────────┐  │
//! │  │  used_by (32-bit atomic)│  payload: T                    │  │
//! │  └─────────────────────────┴────────────────────────────────┘  │
//! ├────────────────────────────────────────────────────────────────┤
//! │  ...                                                           │
//! ├────────────────────────────────────────────────────────────────┤
//! │  Slot[SLOT_COUNT - 1]                                          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each slot's `used_by` word packs the whole ownership state: bits
//! `0..PEER_COUNT` are reader-holds bits, bit 31 is [`WRITER_BIT`] and marks
//! the slot carrying the current message. Keeping both in one word is what
//! makes "may I still lock this slot?" a single load and "may the writer
//! reuse this slot?" a single compare against zero; the two must never be
//! split into separate fields.
//!
//! Every field is an atomic integer or plain bytes whose all-zero pattern is
//! the valid empty state, so a freshly zero-filled region *is* an empty
//! mailbox and no constructor ever runs on the shared path.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::MailboxError;
use crate::peer::{PeerId, SLOT_COUNT};

/// Bit 31 of a slot's `used_by` word: set while the slot holds the current
/// message.
pub const WRITER_BIT: u32 = 1 << 31;

#[repr(C)]
struct Slot<T> {
    used_by: AtomicU32,
    payload: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            used_by: AtomicU32::new(0),
            payload: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

/// Proof of a held reader lock; concretely the slot index.
///
/// Valid from [`Mailbox::lock`] until the matching [`Mailbox::unlock`].
/// Handles are plain values so that crash recovery and the raw container
/// tests can talk about them freely; the [`Inbox`](crate::Inbox) wrapper is
/// what ties one outstanding handle to one process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotHandle(usize);

impl SlotHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Single-writer / multi-reader exchange cell for one peer's output.
///
/// Exactly one process (the region owner) calls [`publish`](Self::publish)
/// and [`reset_writer`](Self::reset_writer); every other peer locks, reads
/// and unlocks. All synchronization is 32-bit atomics on the shared words —
/// no mutex, no futex, no file lock.
#[repr(C)]
pub struct Mailbox<T> {
    /// One-based index of the slot holding the latest message; `0` until the
    /// first publish. One-based so the zero image reads as "empty".
    current_slot_id: AtomicU32,
    slots: [Slot<T>; SLOT_COUNT],
}

unsafe impl<T: Copy + Send> Send for Mailbox<T> {}
unsafe impl<T: Copy + Send> Sync for Mailbox<T> {}

impl<T: Copy> Mailbox<T> {
    /// In-process constructor for tests, benches and thread-local use. The
    /// shared-memory path never calls this: a zero-filled region is already
    /// a valid empty mailbox.
    pub fn new() -> Self {
        Self {
            current_slot_id: AtomicU32::new(0),
            slots: std::array::from_fn(|_| Slot::new()),
        }
    }

    /// True until the first publish.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current_slot_id.load(Ordering::Acquire) == 0
    }

    /// Publishes a new message, replacing the current one.
    ///
    /// Single-writer only. Wait-free: one scan of the slot array plus three
    /// atomic writes.
    ///
    /// # Errors
    ///
    /// [`MailboxError::NoFreeSlot`] if the scan finds no slot with
    /// `used_by == 0`. Under the one-lock-per-process rule this cannot
    /// happen — N+1 slots cover N-1 parked readers, the current slot and
    /// the landing slot — so hitting it means a reader is hoarding handles.
    pub fn publish(&self, update: T) -> Result<(), MailboxError> {
        // The current slot carries WRITER_BIT, so the scan can never pick
        // the slot readers are being directed at.
        let chosen = self
            .slots
            .iter()
            .position(|slot| slot.used_by.load(Ordering::Acquire) == 0)
            .ok_or(MailboxError::NoFreeSlot)?;
        let slot = &self.slots[chosen];

        // The payload must be in place before the release below makes the
        // slot eligible for reader locks.
        unsafe { (*slot.payload.get()).write(update) };
        slot.used_by.fetch_or(WRITER_BIT, Ordering::Release);

        // Linearization point of the publish. Until this store the new slot
        // is marked but unreachable, which is the state reset_writer repairs
        // after a crash right here.
        let old_id = self.current_slot_id.load(Ordering::Relaxed);
        self.current_slot_id
            .store(chosen as u32 + 1, Ordering::Release);

        // Retire the previous current slot. It becomes reclaimable once the
        // last reader bit drops.
        if old_id != 0 {
            self.slots[old_id as usize - 1]
                .used_by
                .fetch_and(!WRITER_BIT, Ordering::Release);
        }
        Ok(())
    }

    /// Locks the most recent slot for `reader` and returns its handle.
    ///
    /// Lock-free: the CAS loop retries only when the writer has published in
    /// between, which is global progress by itself. The returned handle may
    /// stop being the *current* slot the moment this returns — that is fine,
    /// the snapshot stays consistent and at worst one generation stale.
    ///
    /// # Errors
    ///
    /// - [`MailboxError::Empty`] if nothing has ever been published.
    /// - [`MailboxError::AlreadyLocked`] if `reader`'s bit is already set on
    ///   the current slot: the caller broke the one-lock rule.
    pub fn lock(&self, reader: PeerId) -> Result<SlotHandle, MailboxError> {
        if self.is_empty() {
            return Err(MailboxError::Empty);
        }
        loop {
            // Setting the reader bit on the current slot is not one atomic
            // step: between reading current_slot_id and the CAS the writer
            // may retire the slot and start overwriting it. The WRITER_BIT
            // check inside the same CAS-observed word is what makes the
            // combination safe.
            let slot_index = self.current_slot_id.load(Ordering::Acquire) as usize - 1;
            let slot = &self.slots[slot_index];
            let current = slot.used_by.load(Ordering::Acquire);
            if current & WRITER_BIT == 0 {
                // Retired since we read the id; a newer slot is current.
                continue;
            }
            if current & reader.bit() != 0 {
                return Err(MailboxError::AlreadyLocked {
                    peer: reader,
                    slot: slot_index,
                });
            }
            if slot
                .used_by
                .compare_exchange_weak(
                    current,
                    current | reader.bit(),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return Ok(SlotHandle(slot_index));
            }
            // A lost CAS may mean the writer moved on, so restart from the
            // current_slot_id load rather than just re-reading the word.
        }
    }

    /// Releases a lock previously returned to `reader` by [`lock`](Self::lock).
    ///
    /// # Errors
    ///
    /// [`MailboxError::NotHeld`] if `reader`'s bit is not set on the slot the
    /// handle names, whether or not that slot is otherwise in use.
    pub fn unlock(&self, reader: PeerId, handle: SlotHandle) -> Result<(), MailboxError> {
        let slot = &self.slots[handle.0];
        if slot.used_by.load(Ordering::Acquire) & reader.bit() == 0 {
            return Err(MailboxError::NotHeld {
                peer: reader,
                slot: handle.0,
            });
        }
        slot.used_by.fetch_and(!reader.bit(), Ordering::Release);
        Ok(())
    }

    /// Borrows the payload of a locked slot.
    ///
    /// Race-free because the writer never touches a slot whose `used_by`
    /// word is non-zero, and the caller's reader bit keeps it non-zero.
    ///
    /// # Safety
    ///
    /// `handle` must have been returned by [`lock`](Self::lock) to a lock the
    /// caller still holds, and the reference must be dropped before the
    /// matching [`unlock`](Self::unlock). Otherwise the writer may reuse the
    /// slot while the reference is live.
    pub unsafe fn message(&self, handle: SlotHandle) -> &T {
        unsafe { (*self.slots[handle.0].payload.get()).assume_init_ref() }
    }

    /// Drops every lock bit `reader` left behind. Idempotent.
    ///
    /// Called once on attach so a restarted process sheds the locks its
    /// previous incarnation held when it crashed.
    pub fn reset_reader(&self, reader: PeerId) {
        for slot in &self.slots {
            if slot.used_by.load(Ordering::Acquire) & reader.bit() != 0 {
                slot.used_by.fetch_and(!reader.bit(), Ordering::Release);
            }
        }
    }

    /// Clears `WRITER_BIT` from every slot except the current one.
    /// Idempotent.
    ///
    /// Repairs the marked-but-not-yet-current state a producer crash can
    /// leave between payload landing and the `current_slot_id` store. Called
    /// once by the producer on attach.
    pub fn reset_writer(&self) {
        let current = self.current_slot_id.load(Ordering::Acquire);
        for (index, slot) in self.slots.iter().enumerate() {
            if index + 1 == current as usize {
                continue;
            }
            if slot.used_by.load(Ordering::Acquire) & WRITER_BIT != 0 {
                slot.used_by.fetch_and(!WRITER_BIT, Ordering::Release);
            }
        }
    }
}

impl<T: Copy> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes a region must have to hold one `Mailbox<T>`.
pub fn bytes_for_mailbox<T: Copy>() -> usize {
    std::mem::size_of::<Mailbox<T>>()
}
