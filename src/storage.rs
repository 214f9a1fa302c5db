// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Narrow file-access capability consumed from the storage driver.
// Author: Lukas Bower

//! Narrow file-access capability consumed from the storage driver.
//!
//! The streaming job only ever needs sequential byte reads, the file size,
//! the current offset and a flat directory iterator. Drivers implement
//! [`Storage`] synchronously; any latency is theirs to hide.

use heapless::String as HeaplessString;

use crate::error::StorageError;

/// Longest entry name a driver may report.
pub const MAX_NAME_LEN: usize = 96;

/// Fixed-capacity entry name.
pub type EntryName = HeaplessString<MAX_NAME_LEN>;

/// Directory entry reported by [`Storage::read_dir`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name without any directory component.
    pub name: EntryName,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Size in bytes; zero for directories.
    pub size: u64,
}

impl DirEntry {
    /// Build an entry, returning `None` when the name exceeds [`MAX_NAME_LEN`].
    #[must_use]
    pub fn new(name: &str, is_dir: bool, size: u64) -> Option<Self> {
        let mut entry_name = EntryName::new();
        entry_name.push_str(name).ok()?;
        Some(Self {
            name: entry_name,
            is_dir,
            size,
        })
    }
}

/// File-access capability provided by the storage driver.
///
/// Paths use `/` separators; the empty path and `/` both name the root.
pub trait Storage {
    /// Driver work area created once by the first successful mount.
    type Volume: Default;
    /// Open read handle.
    type File;
    /// Open directory iterator.
    type Dir;

    /// Mount the medium using `volume` as the driver work area.
    fn mount(&mut self, volume: &mut Self::Volume) -> Result<(), StorageError>;

    /// Open `path` for reading.
    fn open(&mut self, path: &str) -> Result<Self::File, StorageError>;

    /// Read up to `buf.len()` bytes; `Ok(0)` signals end of file.
    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Total size of the open file in bytes.
    fn size(&self, file: &Self::File) -> u64;

    /// Current read offset of the open file.
    fn tell(&self, file: &Self::File) -> u64;

    /// Release a read handle.
    fn close(&mut self, file: Self::File);

    /// Open the directory at `path` for iteration.
    fn open_dir(&mut self, path: &str) -> Result<Self::Dir, StorageError>;

    /// Next entry in native driver order, `None` once exhausted.
    fn read_dir(&mut self, dir: &mut Self::Dir) -> Result<Option<DirEntry>, StorageError>;

    /// Release a directory iterator.
    fn close_dir(&mut self, dir: Self::Dir);
}
