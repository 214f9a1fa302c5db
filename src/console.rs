// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Interactive console channel and report hooks consumed by the job controller.
// Author: Lukas Bower

//! Interactive console channel consumed by the job controller.

use crate::status::{Message, StatusCode};

/// The console's channel set: character source, output sink and the plain
/// status/feedback reporters.
///
/// While a job streams, the controller routes reads and reports away from
/// these hooks and restores them when the job ends.
pub trait ConsoleChannel {
    /// Next buffered character from the operator, if any.
    fn read(&mut self) -> Option<u8>;

    /// Discard any partially received input.
    fn reset_read_buffer(&mut self);

    /// Emit raw text to the operator.
    fn write(&mut self, text: &str);

    /// Plain per-line status report (`ok` / `error:<n>`).
    fn status_message(&mut self, status: StatusCode);

    /// Plain feedback message report (`[MSG:...]`).
    fn feedback_message(&mut self, message: Message);

    /// Block or unblock full program lines from the operator.
    ///
    /// Real-time command bytes must keep flowing while blocked.
    fn block_program_input(&mut self, _blocked: bool) {}
}
