// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Recursive, bounded directory listing of program files.
// Author: Lukas Bower

//! Recursive, bounded directory listing of program files.
//!
//! Each admitted file produces one machine-parsable record:
//!
//! ```text
//! [FILE:/jobs/part.ngc|SIZE:1532]
//! [FILE:/jobs/bad name.nc|SIZE:88|UNUSABLE]
//! ```

use core::fmt::Write;

use heapless::String as HeaplessString;

use crate::admission::{classify, FilenameStatus};
use crate::config::StreamConfig;
use crate::error::ScanError;
use crate::storage::{Storage, MAX_NAME_LEN};

/// Longest directory path the scanner will build.
pub const MAX_PATH_LEN: usize = 128;
/// Longest decimal rendering of a `u64` file size.
const SIZE_DIGITS: usize = 20;
/// Capacity of a single formatted listing record: the longest path, a
/// separator, the longest name, the largest size and the unusable marker.
pub const RECORD_CAPACITY: usize = RECORD_OPEN.len()
    + MAX_PATH_LEN
    + 1
    + MAX_NAME_LEN
    + SIZE_FIELD.len()
    + SIZE_DIGITS
    + UNUSABLE_MARK.len()
    + RECORD_CLOSE.len();

const RECORD_OPEN: &str = "[FILE:";
const SIZE_FIELD: &str = "|SIZE:";
const UNUSABLE_MARK: &str = "|UNUSABLE";
const RECORD_CLOSE: &str = "]\r\n";

/// Fixed-capacity directory path.
pub type ScanPath = HeaplessString<MAX_PATH_LEN>;
/// Fixed-capacity listing record.
pub type ScanRecord = HeaplessString<RECORD_CAPACITY>;

/// Working storage for a listing: the path being walked and the record
/// being formatted. Both are reused across the whole recursion.
#[derive(Debug, Default)]
pub struct ScanBuffer {
    path: ScanPath,
    record: ScanRecord,
}

impl ScanBuffer {
    /// Create empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// List admitted files below `root`, descending at most `depth` levels
/// (the root counts as one).
///
/// `emit` receives one formatted record at a time, in native driver order.
/// Subdirectories that would overflow the path buffer or exceed the depth
/// are skipped; any storage failure aborts the scan and is returned, with
/// the records already emitted left in place.
pub fn list<S, F>(
    storage: &mut S,
    config: &StreamConfig,
    root: &str,
    depth: u8,
    buffer: &mut ScanBuffer,
    emit: &mut F,
) -> Result<(), ScanError>
where
    S: Storage,
    F: FnMut(&str),
{
    buffer.path.clear();
    let root = root.trim_end_matches('/');
    if buffer.path.push_str(root).is_err() {
        log::warn!("[sdcard] listing root exceeds {MAX_PATH_LEN} bytes");
        return Err(ScanError::Output);
    }
    scan_dir(storage, config, buffer, depth, emit)
}

fn scan_dir<S, F>(
    storage: &mut S,
    config: &StreamConfig,
    buffer: &mut ScanBuffer,
    depth: u8,
    emit: &mut F,
) -> Result<(), ScanError>
where
    S: Storage,
    F: FnMut(&str),
{
    let mut dir = storage
        .open_dir(buffer.path.as_str())
        .map_err(ScanError::OpenDir)?;

    let result = loop {
        let entry = match storage.read_dir(&mut dir) {
            Ok(Some(entry)) => entry,
            Ok(None) => break Ok(()),
            Err(err) => break Err(ScanError::ReadDir(err)),
        };

        if entry.is_dir {
            if classify(config, &entry.name, false) != FilenameStatus::Valid {
                continue;
            }
            if depth <= 1 {
                log::debug!(
                    "[sdcard] depth limit reached, not entering {}/{}",
                    buffer.path,
                    entry.name
                );
                continue;
            }
            let mark = buffer.path.len();
            if buffer.path.push('/').is_err() || buffer.path.push_str(&entry.name).is_err() {
                log::warn!(
                    "[sdcard] path too long, not entering {}/{}",
                    &buffer.path[..mark],
                    entry.name
                );
                buffer.path.truncate(mark);
                continue;
            }
            let nested = scan_dir(storage, config, buffer, depth - 1, emit);
            buffer.path.truncate(mark);
            if let Err(err) = nested {
                break Err(err);
            }
        } else {
            let status = classify(config, &entry.name, true);
            if !status.is_listed() {
                continue;
            }
            buffer.record.clear();
            let unusable = if status == FilenameStatus::Invalid {
                UNUSABLE_MARK
            } else {
                ""
            };
            if write!(
                buffer.record,
                "{RECORD_OPEN}{}/{}{SIZE_FIELD}{}{}{RECORD_CLOSE}",
                buffer.path, entry.name, entry.size, unusable
            )
            .is_err()
            {
                log::warn!(
                    "[sdcard] record for {}/{} exceeds {RECORD_CAPACITY} bytes, skipped",
                    buffer.path,
                    entry.name
                );
                continue;
            }
            emit(buffer.record.as_str());
        }
    };

    storage.close_dir(dir);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemStorage;

    fn run(storage: &mut MemStorage, depth: u8) -> (Result<(), ScanError>, Vec<String>) {
        let mut records = Vec::new();
        let mut buffer = ScanBuffer::new();
        let result = list(
            storage,
            &StreamConfig::default(),
            "",
            depth,
            &mut buffer,
            &mut |record: &str| records.push(record.to_string()),
        );
        (result, records)
    }

    #[test]
    fn lists_admitted_files_and_flags_unusable_ones() {
        let mut storage = MemStorage::new();
        storage.add_file("/part.ngc", b"G0 X0\n");
        storage.add_file("/notes.txt", b"hello");
        storage.add_file("/image.bin", &[0u8; 16]);
        storage.add_file("/bad name.nc", b"G1\n");
        let (result, records) = run(&mut storage, 10);
        assert_eq!(result, Ok(()));
        assert_eq!(
            records,
            [
                "[FILE:/part.ngc|SIZE:6]\r\n",
                "[FILE:/notes.txt|SIZE:5]\r\n",
                "[FILE:/bad name.nc|SIZE:3|UNUSABLE]\r\n",
            ]
        );
        assert_eq!(storage.open_dirs(), 0);
    }

    #[test]
    fn descends_into_subdirectories_and_restores_the_path() {
        let mut storage = MemStorage::new();
        storage.add_file("/jobs/a/one.nc", b"G0\n");
        storage.add_file("/jobs/two.tap", b"G0\n");
        storage.add_file("/top.nc", b"G0\n");
        let (result, records) = run(&mut storage, 10);
        assert_eq!(result, Ok(()));
        assert_eq!(
            records,
            [
                "[FILE:/jobs/a/one.nc|SIZE:3]\r\n",
                "[FILE:/jobs/two.tap|SIZE:3]\r\n",
                "[FILE:/top.nc|SIZE:3]\r\n",
            ]
        );
    }

    #[test]
    fn depth_limit_skips_descent_without_failing() {
        let mut storage = MemStorage::new();
        storage.add_file("/l1/l2/deep.nc", b"G0\n");
        storage.add_file("/l1/mid.nc", b"G0\n");
        storage.add_file("/root.nc", b"G0\n");
        let (result, records) = run(&mut storage, 2);
        assert_eq!(result, Ok(()));
        assert_eq!(
            records,
            ["[FILE:/l1/mid.nc|SIZE:3]\r\n", "[FILE:/root.nc|SIZE:3]\r\n"]
        );
    }

    #[test]
    fn overlong_paths_skip_the_subtree_only() {
        let mut storage = MemStorage::new();
        let long = "d".repeat(90);
        storage.add_file(&format!("/{long}/{long}/x.nc"), b"G0\n");
        storage.add_file(&format!("/{long}/ok.nc"), b"G0\n");
        storage.add_file("/after.nc", b"G0\n");
        let (result, records) = run(&mut storage, 10);
        assert_eq!(result, Ok(()));
        assert_eq!(records.len(), 2);
        assert!(records[0].ends_with("/ok.nc|SIZE:3]\r\n"));
        assert_eq!(records[1], "[FILE:/after.nc|SIZE:3]\r\n");
    }

    #[test]
    fn longest_path_and_name_fit_a_record() {
        let mut storage = MemStorage::new();
        let dir = "d".repeat(63);
        let deep = format!("/{dir}/{dir}");
        assert_eq!(deep.len(), MAX_PATH_LEN);
        let name = format!("{} x.nc", "n".repeat(91));
        assert_eq!(name.len(), MAX_NAME_LEN);

        storage.add_file("/first.nc", b"G0\n");
        storage.add_file(&format!("{deep}/{name}"), &vec![b'G'; 10_000_000]);
        storage.add_file("/last.nc", b"G0\n");
        let (result, records) = run(&mut storage, 10);
        assert_eq!(result, Ok(()));
        assert_eq!(
            records,
            [
                "[FILE:/first.nc|SIZE:3]\r\n".to_string(),
                format!("[FILE:{deep}/{name}|SIZE:10000000|UNUSABLE]\r\n"),
                "[FILE:/last.nc|SIZE:3]\r\n".to_string(),
            ]
        );
    }

    #[test]
    fn overlong_entry_names_are_skipped_not_terminal() {
        let mut storage = MemStorage::new();
        storage.add_file("/a.nc", b"G0\n");
        storage.add_file(&format!("/{}.nc", "x".repeat(MAX_NAME_LEN)), b"G0\n");
        storage.add_file("/b.nc", b"G0\n");
        let (result, records) = run(&mut storage, 10);
        assert_eq!(result, Ok(()));
        assert_eq!(
            records,
            ["[FILE:/a.nc|SIZE:3]\r\n", "[FILE:/b.nc|SIZE:3]\r\n"]
        );
    }

    #[test]
    fn missing_root_is_an_open_error() {
        let mut storage = MemStorage::new();
        let mut buffer = ScanBuffer::new();
        let result = list(
            &mut storage,
            &StreamConfig::default(),
            "/nope",
            10,
            &mut buffer,
            &mut |_: &str| {},
        );
        assert!(matches!(result, Err(ScanError::OpenDir(_))));
    }

    #[test]
    fn read_failure_aborts_but_keeps_emitted_records() {
        let mut storage = MemStorage::new();
        storage.add_file("/first.nc", b"G0\n");
        storage.add_file("/broken/x.nc", b"G0\n");
        storage.add_file("/last.nc", b"G0\n");
        storage.fail_dir("/broken");
        let (result, records) = run(&mut storage, 10);
        assert!(matches!(result, Err(ScanError::ReadDir(_))));
        assert_eq!(records, ["[FILE:/first.nc|SIZE:3]\r\n"]);
        assert_eq!(storage.open_dirs(), 0);
    }
}
