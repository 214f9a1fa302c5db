// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Crate root for the SD-card program streaming subsystem.
// Author: Lukas Bower
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Streams a g-code program stored on removable media into the motion
//! controller as if it had been typed at the console.
//!
//! The [`job::JobController`] sits between the firmware main loop and the
//! interactive console. While a job runs it feeds program bytes to the
//! interpreter, traps status and feedback reports to detect the end of the
//! job, and restores the console exactly once when the job finishes, fails
//! or is reset.

pub mod admission;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod job;
pub mod redirect;
pub mod scan;
pub mod session;
pub mod state;
pub mod status;
pub mod storage;

#[cfg(feature = "std")]
/// Storage backend mapping the card onto a host directory.
pub mod host;

#[cfg(feature = "std")]
/// In-memory collaborators used by unit and integration tests.
pub mod test_support;

pub use admission::{classify, FilenameStatus};
pub use command::{parse_command, SdCommand};
pub use config::StreamConfig;
pub use console::ConsoleChannel;
pub use error::{ConfigError, JobError, ScanError, StorageError};
pub use job::JobController;
pub use redirect::{ChannelKind, ChannelSet, JobState};
pub use session::FileSession;
pub use state::MachineState;
pub use status::{Message, StatusCode};
pub use storage::{DirEntry, Storage};
