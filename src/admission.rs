// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Classify storage entry names for listing and program selection.
// Author: Lukas Bower

//! Filename admission policy.
//!
//! Only program-text files are listed. Names are echoed back through the
//! console buffers, so any character that the console treats as a real-time
//! command byte would be indistinguishable from live operator input and
//! makes the file unusable.

use crate::config::{StreamConfig, MAX_EXTENSION_LEN};

/// Real-time status report request.
pub const CMD_STATUS_REPORT: u8 = b'?';
/// Real-time cycle start / resume.
pub const CMD_CYCLE_START: u8 = b'~';
/// Real-time feed hold.
pub const CMD_FEED_HOLD: u8 = b'!';

/// Bytes that may never appear in a usable file name.
pub const FORBIDDEN_NAME_BYTES: [u8; 4] = [b' ', CMD_STATUS_REPORT, CMD_CYCLE_START, CMD_FEED_HOLD];

/// Outcome of classifying a directory entry name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilenameStatus {
    /// Not a program file; omitted from listings.
    Filtered,
    /// Listed and usable.
    Valid,
    /// Listed but flagged unusable; `run` refuses it.
    Invalid,
}

impl FilenameStatus {
    /// Whether the entry appears in listings.
    #[must_use]
    pub const fn is_listed(self) -> bool {
        !matches!(self, Self::Filtered)
    }
}

/// Classify `name` against the configured admission policy.
///
/// Directories skip the extension filter so listings can descend into them.
#[must_use]
pub fn classify(config: &StreamConfig, name: &str, is_file: bool) -> FilenameStatus {
    if is_file && !has_program_extension(config, name) {
        return FilenameStatus::Filtered;
    }
    if name.bytes().any(|b| FORBIDDEN_NAME_BYTES.contains(&b)) {
        FilenameStatus::Invalid
    } else {
        FilenameStatus::Valid
    }
}

fn has_program_extension(config: &StreamConfig, name: &str) -> bool {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return false;
    };
    ext.len() <= MAX_EXTENSION_LEN && config.admits_extension(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_default(name: &str, is_file: bool) -> FilenameStatus {
        classify(&StreamConfig::default(), name, is_file)
    }

    #[test]
    fn program_files_are_valid_in_any_case() {
        assert_eq!(classify_default("part.ngc", true), FilenameStatus::Valid);
        assert_eq!(classify_default("PART.NC", true), FilenameStatus::Valid);
        assert_eq!(classify_default("notes.Txt", true), FilenameStatus::Valid);
        assert_eq!(classify_default("a.b.gcode", true), FilenameStatus::Valid);
    }

    #[test]
    fn other_files_are_filtered() {
        assert_eq!(classify_default("image.bin", true), FilenameStatus::Filtered);
        assert_eq!(classify_default("README", true), FilenameStatus::Filtered);
        assert_eq!(classify_default("part.", true), FilenameStatus::Filtered);
        assert_eq!(classify_default("x.gcodegcode", true), FilenameStatus::Filtered);
    }

    #[test]
    fn realtime_bytes_and_spaces_make_names_unusable() {
        assert_eq!(classify_default("bad name.nc", true), FilenameStatus::Invalid);
        assert_eq!(classify_default("what?.nc", true), FilenameStatus::Invalid);
        assert_eq!(classify_default("go~.nc", true), FilenameStatus::Invalid);
        assert_eq!(classify_default("stop!.nc", true), FilenameStatus::Invalid);
        assert_eq!(classify_default("bad name.bin", true), FilenameStatus::Filtered);
    }

    #[test]
    fn directories_are_never_filtered() {
        assert_eq!(classify_default("jobs", false), FilenameStatus::Valid);
        assert_eq!(classify_default("old.bak", false), FilenameStatus::Valid);
        assert_eq!(classify_default("my jobs", false), FilenameStatus::Invalid);
        assert!(classify_default("jobs", false).is_listed());
    }
}
