// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Parse the `$F` system command family.
// Author: Lukas Bower

//! Parser for the `$F` system command family.
//!
//! | Line          | Command                  |
//! |---------------|--------------------------|
//! | `$F`          | list program files       |
//! | `$FM`         | mount the card           |
//! | `$F=<path>`   | stream `<path>`          |

use crate::error::{JobError, StorageError};

const PREFIX: &str = "$F";

/// Sub-commands handled by the streaming job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SdCommand<'a> {
    /// List admitted files on the card.
    List,
    /// Mount the card.
    Mount,
    /// Open the file and stream it.
    Run(&'a str),
}

/// Parse a system command line.
///
/// Returns `Ok(None)` for lines outside the `$F` family so the interpreter
/// can offer them to other handlers.
pub fn parse_command(line: &str) -> Result<Option<SdCommand<'_>>, JobError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.strip_prefix(PREFIX) else {
        return Ok(None);
    };
    match rest {
        "" => Ok(Some(SdCommand::List)),
        "M" => Ok(Some(SdCommand::Mount)),
        _ => match rest.strip_prefix('=') {
            Some("") => Err(JobError::Open(StorageError::NotFound)),
            Some(path) => Ok(Some(SdCommand::Run(path))),
            None => Err(JobError::InvalidStatement),
        },
    }
}
