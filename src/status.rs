// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Status and feedback codes exchanged with the command interpreter.
// Author: Lukas Bower

//! Status and feedback codes exchanged with the command interpreter.
//!
//! The numeric values match the codes printed by the controller as
//! `error:<n>` and `[MSG:...]` so hosts can keep parsing them.

use core::fmt;

/// Per-line status reported by the interpreter after executing a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Line executed successfully.
    Ok,
    /// Unsupported or malformed `$` statement.
    InvalidStatement,
    /// Command requires the machine to be idle.
    SystemGClock,
    /// Storage could not be mounted.
    SdMountError,
    /// Program file could not be opened or read.
    SdReadError,
    /// Directory listing failed.
    SdFailedOpenDir,
    /// The command does not belong to this handler; the interpreter should
    /// try other handlers.
    Unhandled,
    /// Any other interpreter status, carried through unchanged.
    Other(u8),
}

impl StatusCode {
    const UNHANDLED_CODE: u8 = 255;

    /// Return the numeric code reported to the operator.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::InvalidStatement => 3,
            Self::SystemGClock => 8,
            Self::SdMountError => 60,
            Self::SdReadError => 61,
            Self::SdFailedOpenDir => 62,
            Self::Unhandled => Self::UNHANDLED_CODE,
            Self::Other(code) => code,
        }
    }

    /// Decode a numeric interpreter status.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Ok,
            3 => Self::InvalidStatement,
            8 => Self::SystemGClock,
            60 => Self::SdMountError,
            61 => Self::SdReadError,
            62 => Self::SdFailedOpenDir,
            Self::UNHANDLED_CODE => Self::Unhandled,
            other => Self::Other(other),
        }
    }

    /// Whether the status denotes success.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            other => write!(f, "error:{}", other.code()),
        }
    }
}

/// Feedback messages raised by the interpreter outside the per-line status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Message {
    /// Critical event; the machine needs a reset.
    CriticalEvent,
    /// Alarm lock is active.
    AlarmLock,
    /// Alarm lock was cleared.
    AlarmUnlock,
    /// Check mode or a similar option was enabled.
    Enabled,
    /// Check mode or a similar option was disabled.
    Disabled,
    /// Safety door is open.
    SafetyDoorAjar,
    /// Program reached `M2`/`M30`.
    ProgramEnd,
    /// Any other feedback message, carried through unchanged.
    Other(u8),
}

impl Message {
    /// Return the numeric message code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::CriticalEvent => 1,
            Self::AlarmLock => 2,
            Self::AlarmUnlock => 3,
            Self::Enabled => 4,
            Self::Disabled => 5,
            Self::SafetyDoorAjar => 6,
            Self::ProgramEnd => 8,
            Self::Other(code) => code,
        }
    }

    /// Human readable text printed inside `[MSG:...]`.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::CriticalEvent => "Reset to continue",
            Self::AlarmLock => "'$H'|'$X' to unlock",
            Self::AlarmUnlock => "Caution: Unlocked",
            Self::Enabled => "Enabled",
            Self::Disabled => "Disabled",
            Self::SafetyDoorAjar => "Check Door",
            Self::ProgramEnd => "Pgm End",
            Self::Other(_) => "",
        }
    }
}
