// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Lifecycle and read accounting for the single open program file.
// Author: Lukas Bower

//! Lifecycle and read accounting for the single open program file.

use crate::error::StorageError;
use crate::storage::Storage;

/// The one program file open for streaming, with its read accounting.
///
/// `line_number` counts completed lines. It is advanced by
/// [`FileSession::account_line`] at the start of the read that follows the
/// first byte of a terminator run, so an error raised while a line executes
/// is attributed to that line rather than the next one.
pub struct FileSession<S: Storage> {
    handle: Option<S::File>,
    size: u64,
    position: u64,
    line_number: u32,
    eol_run: u8,
    line_counted: bool,
}

impl<S: Storage> Default for FileSession<S> {
    fn default() -> Self {
        Self {
            handle: None,
            size: 0,
            position: 0,
            line_number: 0,
            eol_run: 0,
            line_counted: false,
        }
    }
}

impl<S: Storage> FileSession<S> {
    /// Create a closed session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path`, closing any file already held.
    ///
    /// On failure the session is left closed.
    pub fn open(&mut self, storage: &mut S, path: &str) -> Result<(), StorageError> {
        self.close(storage);
        let file = storage.open(path)?;
        self.size = storage.size(&file);
        self.position = 0;
        self.line_number = 0;
        self.eol_run = 0;
        self.line_counted = false;
        self.handle = Some(file);
        log::debug!("[sdcard] opened {path} ({size} bytes)", size = self.size);
        Ok(())
    }

    /// Read the next program byte.
    ///
    /// Returns `None` on end of file or I/O failure and closes the session.
    pub fn read_byte(&mut self, storage: &mut S) -> Option<u8> {
        let file = self.handle.as_mut()?;
        let mut byte = [0u8; 1];
        match storage.read(file, &mut byte) {
            Ok(1) => {
                self.position = storage.tell(file).min(self.size);
            }
            Ok(_) => {
                self.close(storage);
                return None;
            }
            Err(err) => {
                log::warn!(
                    "[sdcard] read failed at offset {pos}: {err}",
                    pos = self.position
                );
                self.close(storage);
                return None;
            }
        }

        if matches!(byte[0], b'\r' | b'\n') {
            self.eol_run = self.eol_run.saturating_add(1);
        } else {
            self.eol_run = 0;
        }
        self.line_counted = false;
        Some(byte[0])
    }

    /// Count the line whose terminator run has just begun.
    ///
    /// Returns `true` when the line number advanced. Repeated calls without an
    /// intervening byte never count the same terminator twice.
    pub fn account_line(&mut self) -> bool {
        if self.eol_run == 1 && !self.line_counted {
            self.line_number = self.line_number.saturating_add(1);
            self.line_counted = true;
            return true;
        }
        false
    }

    /// Supply the terminator missing from an improperly terminated last line.
    ///
    /// Yields `\n` once when the file ended mid-line; the synthesised byte is
    /// counted by the next [`FileSession::account_line`]. Empty files and
    /// properly terminated files yield nothing.
    pub fn terminate_line(&mut self) -> Option<u8> {
        if self.eol_run != 0 || self.position == 0 {
            return None;
        }
        self.eol_run = 1;
        self.line_counted = false;
        Some(b'\n')
    }

    /// Release the handle; safe to call when already closed.
    pub fn close(&mut self, storage: &mut S) {
        if let Some(file) = self.handle.take() {
            storage.close(file);
            log::debug!(
                "[sdcard] closed program at offset {pos}/{size}",
                pos = self.position,
                size = self.size
            );
        }
    }

    /// Whether a file is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Size of the current or last opened file.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read offset within the current or last opened file.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Completed lines consumed so far.
    #[must_use]
    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    /// One-based number of the line currently being executed.
    ///
    /// Once the file has closed on an accounted terminator no further line
    /// follows, so the last counted line is reported.
    #[must_use]
    pub fn line_in_progress(&self) -> u32 {
        let terminator_pending = self.eol_run == 1 && !self.line_counted;
        if !self.is_open() && self.eol_run > 0 && !terminator_pending && self.line_number > 0 {
            return self.line_number;
        }
        self.line_number.saturating_add(1)
    }

    /// Consecutive CR/LF bytes seen since the last other byte.
    #[must_use]
    pub fn eol_run(&self) -> u8 {
        self.eol_run
    }

    /// Fraction of the file consumed, in `[0, 1]`; zero for empty files.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.size == 0 {
            return 0.0;
        }
        (self.position as f32 / self.size as f32).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemStorage;

    fn drain(session: &mut FileSession<MemStorage>, storage: &mut MemStorage) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            session.account_line();
            match session.read_byte(storage) {
                Some(byte) => out.push(byte),
                None => match session.terminate_line() {
                    Some(byte) => out.push(byte),
                    None => break,
                },
            }
        }
        session.account_line();
        out
    }

    #[test]
    fn counts_terminated_lines_once_per_terminator_run() {
        let mut storage = MemStorage::new();
        storage.add_file("/crlf.nc", b"G0 X1\r\nG0 X2\r\n\r\nG0 X3\n");
        let mut session = FileSession::new();
        session.open(&mut storage, "/crlf.nc").unwrap();
        let bytes = drain(&mut session, &mut storage);
        assert_eq!(bytes, b"G0 X1\r\nG0 X2\r\n\r\nG0 X3\n");
        assert_eq!(session.line_number(), 3);
        assert!(!session.is_open());
        assert_eq!(storage.open_files(), 0);
    }

    #[test]
    fn unterminated_last_line_gets_one_synthetic_newline() {
        let mut storage = MemStorage::new();
        storage.add_file("/short.nc", b"G0 X1\nG0 X2");
        let mut session = FileSession::new();
        session.open(&mut storage, "/short.nc").unwrap();
        let bytes = drain(&mut session, &mut storage);
        assert_eq!(bytes, b"G0 X1\nG0 X2\n");
        assert_eq!(session.line_number(), 2);
        assert_eq!(session.terminate_line(), None);
    }

    #[test]
    fn line_in_progress_stops_at_last_line_after_close() {
        let mut storage = MemStorage::new();
        storage.add_file("/two.nc", b"G0\r\nG1\r\n");
        let mut session = FileSession::new();
        session.open(&mut storage, "/two.nc").unwrap();
        assert_eq!(session.line_in_progress(), 1);
        for _ in 0..5 {
            session.account_line();
            session.read_byte(&mut storage);
        }
        assert_eq!(session.line_in_progress(), 2);
        drain(&mut session, &mut storage);
        assert!(!session.is_open());
        assert_eq!(session.line_in_progress(), 2);
    }

    #[test]
    fn empty_file_yields_nothing() {
        let mut storage = MemStorage::new();
        storage.add_file("/empty.nc", b"");
        let mut session = FileSession::new();
        session.open(&mut storage, "/empty.nc").unwrap();
        assert!(drain(&mut session, &mut storage).is_empty());
        assert_eq!(session.line_number(), 0);
        assert_eq!(session.progress(), 0.0);
    }

    #[test]
    fn progress_is_monotonic_and_reaches_one() {
        let mut storage = MemStorage::new();
        storage.add_file("/p.nc", b"G1 X1\nG1 X2\n");
        let mut session = FileSession::new();
        session.open(&mut storage, "/p.nc").unwrap();
        let mut last = session.progress();
        while session.read_byte(&mut storage).is_some() {
            let now = session.progress();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 1.0);
        assert!(session.position() <= session.size());
    }

    #[test]
    fn reopening_closes_previous_handle() {
        let mut storage = MemStorage::new();
        storage.add_file("/a.nc", b"G0\n");
        storage.add_file("/b.nc", b"G1\n");
        let mut session = FileSession::new();
        session.open(&mut storage, "/a.nc").unwrap();
        session.read_byte(&mut storage);
        session.open(&mut storage, "/b.nc").unwrap();
        assert_eq!(storage.open_files(), 1);
        assert_eq!(session.position(), 0);
        assert_eq!(session.read_byte(&mut storage), Some(b'G'));
    }

    #[test]
    fn failed_open_leaves_session_closed() {
        let mut storage = MemStorage::new();
        storage.add_file("/a.nc", b"G0\n");
        let mut session = FileSession::new();
        session.open(&mut storage, "/a.nc").unwrap();
        assert_eq!(
            session.open(&mut storage, "/missing.nc"),
            Err(StorageError::NotFound)
        );
        assert!(!session.is_open());
        assert_eq!(storage.open_files(), 0);
    }

    #[test]
    fn read_error_ends_the_session() {
        let mut storage = MemStorage::new();
        storage.add_file("/bad.nc", b"G0 X1\nG0 X2\n");
        storage.fail_reads_at("/bad.nc", 3);
        let mut session = FileSession::new();
        session.open(&mut storage, "/bad.nc").unwrap();
        let bytes = drain(&mut session, &mut storage);
        assert_eq!(bytes, b"G0 \n");
        assert!(!session.is_open());
        assert_eq!(session.line_number(), 1);
    }
}
