// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Machine execution state flags consulted by the streaming job.
// Author: Lukas Bower

//! Machine execution state as published by the real-time executor.

use bitflags::bitflags;

bitflags! {
    /// Execution state of the motion controller.
    ///
    /// `IDLE` is the empty set; every other flag marks an activity that
    /// keeps the machine busy.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MachineState: u16 {
        /// Alarm lock is active.
        const ALARM = 1 << 0;
        /// G-code check mode.
        const CHECK_MODE = 1 << 1;
        /// Homing cycle in progress.
        const HOMING = 1 << 2;
        /// Executing motion.
        const CYCLE = 1 << 3;
        /// Feed hold in progress or complete.
        const HOLD = 1 << 4;
        /// Jogging.
        const JOG = 1 << 5;
        /// Safety door is open.
        const SAFETY_DOOR = 1 << 6;
        /// Sleep mode.
        const SLEEP = 1 << 7;
        /// Manual tool change pending.
        const TOOL_CHANGE = 1 << 8;
    }
}

impl MachineState {
    /// Machine idle; no flag set.
    pub const IDLE: Self = Self::empty();

    /// Whether the machine is idle.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        self.is_empty()
    }

    /// Whether program bytes may be pulled from storage in this state.
    ///
    /// Reading continues while motion executes or is held so the planner
    /// stays fed; any other state stops the program.
    #[must_use]
    pub fn accepts_program_input(self) -> bool {
        self.is_idle() || self.intersects(Self::CYCLE | Self::HOLD)
    }
}

impl Default for MachineState {
    fn default() -> Self {
        Self::IDLE
    }
}
