//! `lattice-shm`: file-backed shared memory mappings.
//!
//! A peer's outbox region is an ordinary file mapped `MAP_SHARED` by every
//! participant. The crash model dictates the two open paths:
//!
//! - the producer *creates or reopens* its region without truncating it, so
//!   a restart after a crash sees the slots its previous incarnation left
//!   behind (a fresh file is zero-filled by `set_len`, which is exactly the
//!   empty-container image);
//! - consumers *open* an existing region read-write (they flip lock bits in
//!   it) and fail fast when it is not there yet, leaving the retry cadence
//!   to the caller.
//!
//! Nothing here unlinks the file: region removal is an administrative
//! concern, not part of the exchange protocol.

use memmap2::MmapMut;
use std::{
    fs::{File, OpenOptions},
    io,
    path::Path,
};

pub struct ShmFileMut {
    _file: File,
    mmap: MmapMut,
}

impl ShmFileMut {
    /// Create the region if absent, reopen it untouched if present, and map
    /// it read-write. `set_len` zero-fills a fresh file to `size_bytes` and
    /// is a no-op on an existing region of the same size.
    pub fn create_or_open<P: AsRef<Path>>(path: P, size_bytes: u64) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        file.set_len(size_bytes)?;

        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self { _file: file, mmap })
    }

    /// Open an existing region and map it read-write. Fails with `NotFound`
    /// when the owning peer has not created it yet.
    pub fn open_rw<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self { _file: file, mmap })
    }

    /// Raw pointer to the start of the mapped region.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mmap.as_mut_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.len() == 0
    }
}
