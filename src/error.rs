// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Error types surfaced by the streaming job subsystem.
// Author: Lukas Bower

//! Error types surfaced by the streaming job subsystem.

use thiserror::Error;

use crate::status::StatusCode;

/// Failures reported by the storage collaborator.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The medium is absent or could not be mounted.
    #[error("storage not mounted")]
    NotMounted,
    /// The requested path does not exist.
    #[error("path not found")]
    NotFound,
    /// The path is malformed or escapes the volume.
    #[error("invalid path")]
    InvalidPath,
    /// The driver reported an I/O failure.
    #[error("storage I/O failure")]
    Io,
}

/// Failures raised while enumerating the card.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    /// The root directory of the scan could not be opened.
    #[error("failed to open directory: {0}")]
    OpenDir(StorageError),
    /// Reading a directory failed part way through the scan.
    #[error("failed to read directory: {0}")]
    ReadDir(StorageError),
    /// The console rejected a listing record.
    #[error("listing output failed")]
    Output,
}

/// Job lifecycle failures, each mapped to the status code the operator sees.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum JobError {
    /// The machine is not idle.
    #[error("machine busy")]
    Busy,
    /// Mounting the card failed.
    #[error("mount failed: {0}")]
    Mount(StorageError),
    /// The program file could not be opened.
    #[error("open failed: {0}")]
    Open(StorageError),
    /// The program name is not admissible.
    #[error("file name not usable")]
    UnusableName,
    /// Directory listing failed.
    #[error("listing failed: {0}")]
    Scan(ScanError),
    /// The sub-command is not recognised.
    #[error("invalid statement")]
    InvalidStatement,
}

impl JobError {
    /// Status code reported to the command originator.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Busy => StatusCode::SystemGClock,
            Self::Mount(_) => StatusCode::SdMountError,
            Self::Open(_) | Self::UnusableName => StatusCode::SdReadError,
            Self::Scan(_) => StatusCode::SdFailedOpenDir,
            Self::InvalidStatement => StatusCode::InvalidStatement,
        }
    }
}

impl From<ScanError> for JobError {
    fn from(err: ScanError) -> Self {
        Self::Scan(err)
    }
}

/// Configuration validation failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Scan depth must allow at least the root directory.
    #[error("scan depth must be >= 1")]
    ZeroDepth,
    /// No program extension admitted.
    #[error("at least one program extension is required")]
    NoExtensions,
    /// Too many extensions for the fixed-capacity list.
    #[error("too many program extensions (max {0})")]
    TooManyExtensions(usize),
    /// Extension empty, too long or not alphanumeric.
    #[error("invalid program extension")]
    InvalidExtension,
}
