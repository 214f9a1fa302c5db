// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Storage backend mapping the card onto a host directory.
// Author: Lukas Bower

//! Storage backend that presents a host directory as the card root.

use std::fs::{self, File, ReadDir};
use std::io::{self, ErrorKind, Read};
use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;
use crate::storage::{DirEntry, Storage, MAX_NAME_LEN};

/// Mount record for a host directory.
#[derive(Debug, Default)]
pub struct HostVolume {
    mounted: bool,
}

impl HostVolume {
    /// Whether the last mount attempt succeeded.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

/// Open program file on the host.
#[derive(Debug)]
pub struct HostFile {
    file: File,
    size: u64,
    offset: u64,
}

/// Card backed by a directory tree on the host filesystem.
#[derive(Debug, Clone)]
pub struct HostStorage {
    root: PathBuf,
}

impl HostStorage {
    /// Serve the tree below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Host directory serving as the card root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let mut resolved = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(StorageError::InvalidPath),
            }
        }
        Ok(resolved)
    }
}

fn map_io(err: &io::Error) -> StorageError {
    match err.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        _ => StorageError::Io,
    }
}

impl Storage for HostStorage {
    type Volume = HostVolume;
    type File = HostFile;
    type Dir = ReadDir;

    fn mount(&mut self, volume: &mut Self::Volume) -> Result<(), StorageError> {
        volume.mounted = self.root.is_dir();
        if !volume.mounted {
            log::warn!("[sdcard] host root {} is not a directory", self.root.display());
            return Err(StorageError::NotMounted);
        }
        Ok(())
    }

    fn open(&mut self, path: &str) -> Result<Self::File, StorageError> {
        let resolved = self.resolve(path)?;
        let file = File::open(&resolved).map_err(|err| map_io(&err))?;
        let metadata = file.metadata().map_err(|err| map_io(&err))?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound);
        }
        Ok(HostFile {
            file,
            size: metadata.len(),
            offset: 0,
        })
    }

    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, StorageError> {
        let count = file.file.read(buf).map_err(|err| map_io(&err))?;
        file.offset += count as u64;
        Ok(count)
    }

    fn size(&self, file: &Self::File) -> u64 {
        file.size
    }

    fn tell(&self, file: &Self::File) -> u64 {
        file.offset
    }

    fn close(&mut self, file: Self::File) {
        drop(file);
    }

    fn open_dir(&mut self, path: &str) -> Result<Self::Dir, StorageError> {
        let resolved = self.resolve(path)?;
        fs::read_dir(resolved).map_err(|err| map_io(&err))
    }

    fn read_dir(&mut self, dir: &mut Self::Dir) -> Result<Option<DirEntry>, StorageError> {
        for entry in dir.by_ref() {
            let entry = entry.map_err(|err| map_io(&err))?;
            let metadata = entry.metadata().map_err(|err| map_io(&err))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                log::warn!("[sdcard] skipping non UTF-8 entry {:?}", entry.path());
                continue;
            };
            let size = if metadata.is_dir() { 0 } else { metadata.len() };
            match DirEntry::new(name, metadata.is_dir(), size) {
                Some(entry) => return Ok(Some(entry)),
                None => {
                    log::warn!("[sdcard] skipping entry longer than {MAX_NAME_LEN} bytes: {name}");
                }
            }
        }
        Ok(None)
    }

    fn close_dir(&mut self, dir: Self::Dir) {
        drop(dir);
    }
}
