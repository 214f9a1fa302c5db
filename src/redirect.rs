// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Channel sets and the redirection state machine of the streaming job.
// Author: Lukas Bower

//! Channel sets and the redirection state machine.
//!
//! The firmware reads characters and reports status through whichever
//! [`ChannelSet`] is active. The set is never patched hook by hook: it is a
//! closed enum, selected by [`JobState`], so saving and restoring it is a
//! move of a single value. A saved set only exists inside the
//! [`JobState::Streaming`] and [`JobState::Suspended`] variants, which makes
//! a second save without a restore unrepresentable.

/// Who currently owns the input stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Interactive console.
    Console,
    /// Storage-backed program.
    Storage,
}

/// Source the firmware's read hook pulls characters from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadSource {
    /// Operator input.
    Console,
    /// The open program file.
    Program,
}

/// Where a status or feedback report goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookRoute {
    /// Straight to the console's plain reporter.
    Forward,
    /// Through the job's trapping hook.
    Trap,
}

/// Bundle of read, suspend, status and feedback hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelSet {
    /// Plain console: operator input and plain reporting.
    Console,
    /// Program streaming: program input, trapping status and feedback.
    Storage,
    /// Program parked for a tool change or jog: operator input and plain
    /// status, feedback still trapped so a program end is noticed.
    Suspended,
}

impl ChannelSet {
    /// Channel kind tag.
    #[must_use]
    pub const fn kind(self) -> ChannelKind {
        match self {
            Self::Console => ChannelKind::Console,
            Self::Storage | Self::Suspended => ChannelKind::Storage,
        }
    }

    /// Read hook of this set.
    #[must_use]
    pub const fn read_source(self) -> ReadSource {
        match self {
            Self::Storage => ReadSource::Program,
            Self::Console | Self::Suspended => ReadSource::Console,
        }
    }

    /// Status hook of this set.
    #[must_use]
    pub const fn status_route(self) -> HookRoute {
        match self {
            Self::Storage => HookRoute::Trap,
            Self::Console | Self::Suspended => HookRoute::Forward,
        }
    }

    /// Feedback hook of this set.
    #[must_use]
    pub const fn feedback_route(self) -> HookRoute {
        match self {
            Self::Console => HookRoute::Forward,
            Self::Storage | Self::Suspended => HookRoute::Trap,
        }
    }

    /// Whether the set installs a suspend handler.
    #[must_use]
    pub const fn has_suspend_handler(self) -> bool {
        matches!(self.kind(), ChannelKind::Storage)
    }

    /// Whether full program lines from the operator are refused.
    #[must_use]
    pub const fn blocks_program_input(self) -> bool {
        matches!(self, Self::Storage)
    }
}

/// Streaming job state; owns the saved channel set while a job exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobState {
    /// No job; the console set is active.
    #[default]
    Idle,
    /// Program streaming.
    Streaming {
        /// Set to reinstall when the job ends.
        saved: ChannelSet,
    },
    /// Program parked; the console serves input until resumed.
    Suspended {
        /// Set to reinstall when the job ends.
        saved: ChannelSet,
    },
}

impl JobState {
    /// Currently installed channel set.
    #[must_use]
    pub const fn active(&self) -> ChannelSet {
        match self {
            Self::Idle => ChannelSet::Console,
            Self::Streaming { .. } => ChannelSet::Storage,
            Self::Suspended { .. } => ChannelSet::Suspended,
        }
    }

    /// Snapshot taken when redirection began, if a job exists.
    #[must_use]
    pub const fn saved(&self) -> Option<ChannelSet> {
        match self {
            Self::Idle => None,
            Self::Streaming { saved } | Self::Suspended { saved } => Some(*saved),
        }
    }

    /// Whether a job exists.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Install the storage set.
    ///
    /// From `Idle` the console set is saved. When a job already exists its
    /// original snapshot is kept; the storage set is never saved over it.
    pub fn redirect(&mut self) {
        let saved = match *self {
            Self::Idle => self.active(),
            Self::Streaming { saved } | Self::Suspended { saved } => saved,
        };
        *self = Self::Streaming { saved };
    }

    /// Park a streaming job. Returns `false` when no job exists.
    pub fn suspend(&mut self) -> bool {
        match *self {
            Self::Idle => false,
            Self::Streaming { saved } | Self::Suspended { saved } => {
                *self = Self::Suspended { saved };
                true
            }
        }
    }

    /// Resume a parked job. Returns `false` when no job exists.
    pub fn resume(&mut self) -> bool {
        match *self {
            Self::Idle => false,
            Self::Streaming { saved } | Self::Suspended { saved } => {
                *self = Self::Streaming { saved };
                true
            }
        }
    }

    /// End the job, handing back the saved set exactly once.
    pub fn restore(&mut self) -> Option<ChannelSet> {
        let saved = self.saved();
        *self = Self::Idle;
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_has_console_set_and_no_save() {
        let state = JobState::default();
        assert_eq!(state.active(), ChannelSet::Console);
        assert_eq!(state.saved(), None);
        assert!(!state.active().has_suspend_handler());
    }

    #[test]
    fn redirect_suspend_resume_restore_round_trip() {
        let mut state = JobState::Idle;
        let before = state.active();
        state.redirect();
        assert_eq!(state.active(), ChannelSet::Storage);
        assert_eq!(state.active().read_source(), ReadSource::Program);
        assert_eq!(state.active().status_route(), HookRoute::Trap);
        assert!(state.active().blocks_program_input());

        for _ in 0..3 {
            assert!(state.suspend());
            assert_eq!(state.active().read_source(), ReadSource::Console);
            assert_eq!(state.active().status_route(), HookRoute::Forward);
            assert_eq!(state.active().feedback_route(), HookRoute::Trap);
            assert_eq!(state.active().kind(), ChannelKind::Storage);
            assert!(state.resume());
        }

        assert_eq!(state.restore(), Some(before));
        assert_eq!(state.active(), before);
        assert_eq!(state.restore(), None);
    }

    #[test]
    fn redirect_while_streaming_keeps_original_save() {
        let mut state = JobState::Idle;
        state.redirect();
        state.redirect();
        assert_eq!(
            state,
            JobState::Streaming {
                saved: ChannelSet::Console
            }
        );
        state.suspend();
        state.redirect();
        assert_eq!(state.saved(), Some(ChannelSet::Console));
        assert_eq!(state.active(), ChannelSet::Storage);
    }

    #[test]
    fn suspend_without_job_is_refused() {
        let mut state = JobState::Idle;
        assert!(!state.suspend());
        assert!(!state.resume());
        assert_eq!(state, JobState::Idle);
    }
}
