// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: In-memory storage and console collaborators for host tests.
// Author: Lukas Bower

//! In-memory storage and console collaborators for host tests.

use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use crate::console::ConsoleChannel;
use crate::error::StorageError;
use crate::status::{Message, StatusCode};
use crate::storage::{DirEntry, Storage, MAX_NAME_LEN};

struct MemNode {
    path: String,
    data: Vec<u8>,
    is_dir: bool,
}

/// Read handle into a [`MemStorage`] file.
#[derive(Debug)]
pub struct MemFile {
    index: usize,
    offset: usize,
}

/// Directory cursor into a [`MemStorage`] tree.
#[derive(Debug)]
pub struct MemDir {
    path: String,
    cursor: usize,
}

/// Volume work area; counts the mounts it has served.
#[derive(Debug, Default)]
pub struct MemVolume {
    /// Successful and failed mount attempts made with this volume.
    pub mounts: u32,
}

/// Flat in-memory card. Entries are reported in insertion order.
#[derive(Default)]
pub struct MemStorage {
    nodes: Vec<MemNode>,
    open_files: usize,
    open_dirs: usize,
    fail_mount: bool,
    read_faults: Vec<(String, usize)>,
    dir_faults: Vec<String>,
}

impl MemStorage {
    /// Create an empty card.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating parent directories as needed.
    pub fn add_file(&mut self, path: &str, data: &[u8]) {
        let path = normalise(path);
        self.add_parents(&path);
        self.nodes.push(MemNode {
            path,
            data: data.to_vec(),
            is_dir: false,
        });
    }

    /// Add an empty directory, creating parents as needed.
    pub fn add_dir(&mut self, path: &str) {
        let path = normalise(path);
        self.add_parents(&path);
        if !self.nodes.iter().any(|node| node.path == path) {
            self.nodes.push(MemNode {
                path,
                data: Vec::new(),
                is_dir: true,
            });
        }
    }

    /// Make every mount attempt fail.
    pub fn fail_mount(&mut self, fail: bool) {
        self.fail_mount = fail;
    }

    /// Fail reads of `path` once the offset reaches `offset`.
    pub fn fail_reads_at(&mut self, path: &str, offset: usize) {
        self.read_faults.push((normalise(path), offset));
    }

    /// Fail reading entries of the directory at `path`.
    pub fn fail_dir(&mut self, path: &str) {
        self.dir_faults.push(normalise(path));
    }

    /// Number of file handles currently open.
    #[must_use]
    pub fn open_files(&self) -> usize {
        self.open_files
    }

    /// Number of directory iterators currently open.
    #[must_use]
    pub fn open_dirs(&self) -> usize {
        self.open_dirs
    }

    fn add_parents(&mut self, path: &str) {
        if path.is_empty() {
            return;
        }
        let mut end = 0;
        while let Some(next) = path[end + 1..].find('/') {
            end += next + 1;
            let parent = &path[..end];
            if !self.nodes.iter().any(|node| node.path == parent) {
                self.nodes.push(MemNode {
                    path: parent.into(),
                    data: Vec::new(),
                    is_dir: true,
                });
            }
        }
    }

    fn parent_of(path: &str) -> &str {
        path.rfind('/').map_or("", |idx| &path[..idx])
    }
}

fn normalise(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.into()
    } else {
        let mut out = String::from("/");
        out.push_str(trimmed);
        out
    }
}

impl Storage for MemStorage {
    type Volume = MemVolume;
    type File = MemFile;
    type Dir = MemDir;

    fn mount(&mut self, volume: &mut Self::Volume) -> Result<(), StorageError> {
        volume.mounts += 1;
        if self.fail_mount {
            return Err(StorageError::NotMounted);
        }
        Ok(())
    }

    fn open(&mut self, path: &str) -> Result<Self::File, StorageError> {
        let path = normalise(path);
        let index = self
            .nodes
            .iter()
            .position(|node| !node.is_dir && node.path == path)
            .ok_or(StorageError::NotFound)?;
        self.open_files += 1;
        Ok(MemFile { index, offset: 0 })
    }

    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, StorageError> {
        let node = &self.nodes[file.index];
        let faulted = self
            .read_faults
            .iter()
            .any(|(path, offset)| *path == node.path && file.offset >= *offset);
        if faulted {
            return Err(StorageError::Io);
        }
        let remaining = &node.data[file.offset.min(node.data.len())..];
        let count = remaining.len().min(buf.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        file.offset += count;
        Ok(count)
    }

    fn size(&self, file: &Self::File) -> u64 {
        self.nodes[file.index].data.len() as u64
    }

    fn tell(&self, file: &Self::File) -> u64 {
        file.offset as u64
    }

    fn close(&mut self, _file: Self::File) {
        self.open_files -= 1;
    }

    fn open_dir(&mut self, path: &str) -> Result<Self::Dir, StorageError> {
        let path = normalise(path);
        let exists = path.is_empty() || self.nodes.iter().any(|node| node.is_dir && node.path == path);
        if !exists {
            return Err(StorageError::NotFound);
        }
        self.open_dirs += 1;
        Ok(MemDir { path, cursor: 0 })
    }

    fn read_dir(&mut self, dir: &mut Self::Dir) -> Result<Option<DirEntry>, StorageError> {
        if self.dir_faults.contains(&dir.path) {
            return Err(StorageError::Io);
        }
        while let Some(node) = self.nodes.get(dir.cursor) {
            dir.cursor += 1;
            if Self::parent_of(&node.path) != dir.path {
                continue;
            }
            let name = &node.path[dir.path.len() + 1..];
            match DirEntry::new(name, node.is_dir, node.data.len() as u64) {
                Some(entry) => return Ok(Some(entry)),
                None => log::warn!("[sdcard] skipping entry longer than {MAX_NAME_LEN} bytes: {name}"),
            }
        }
        Ok(None)
    }

    fn close_dir(&mut self, _dir: Self::Dir) {
        self.open_dirs -= 1;
    }
}

/// Console stub recording everything the controller routes to it.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    /// Identity used to prove the same console comes back after a job.
    pub id: u32,
    /// Text written to the operator, including formatted reports.
    pub output: String,
    /// Bytes the operator has typed but not yet read.
    pub input: VecDeque<u8>,
    /// Status reports received through the plain hook.
    pub statuses: Vec<StatusCode>,
    /// Feedback messages received through the plain hook.
    pub messages: Vec<Message>,
    /// Number of read buffer resets.
    pub resets: usize,
    /// Last program-input block state pushed by the controller.
    pub blocked: bool,
}

impl RecordingConsole {
    /// Create a console with the given identity.
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Queue operator input.
    pub fn type_text(&mut self, text: &str) {
        self.input.extend(text.bytes());
    }

    /// Take and clear the recorded output.
    pub fn take_output(&mut self) -> String {
        core::mem::take(&mut self.output)
    }
}

impl ConsoleChannel for RecordingConsole {
    fn read(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn reset_read_buffer(&mut self) {
        self.input.clear();
        self.resets += 1;
    }

    fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn status_message(&mut self, status: StatusCode) {
        self.statuses.push(status);
        self.output.push_str(&std::format!("{status}\r\n"));
    }

    fn feedback_message(&mut self, message: Message) {
        self.messages.push(message);
        self.output
            .push_str(&std::format!("[MSG:{}]\r\n", message.text()));
    }

    fn block_program_input(&mut self, blocked: bool) {
        self.blocked = blocked;
    }
}
