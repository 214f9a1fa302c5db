// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Console channel writing operator output to a host stream.
// Author: Lukas Bower

use std::collections::VecDeque;
use std::io::Write;

use sdstream::{ConsoleChannel, Message, StatusCode};

/// Console that prints reports to `out` and serves queued operator input.
pub struct WriterConsole<W: Write> {
    out: W,
    input: VecDeque<u8>,
}

impl<W: Write> WriterConsole<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            input: VecDeque::new(),
        }
    }

    /// Queue operator text, as if typed at the terminal.
    #[cfg(test)]
    pub fn queue_input(&mut self, text: &str) {
        self.input.extend(text.bytes());
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()) {
            log::warn!("[console] write failed: {err}");
        }
    }
}

impl<W: Write> ConsoleChannel for WriterConsole<W> {
    fn read(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn reset_read_buffer(&mut self) {
        self.input.clear();
    }

    fn write(&mut self, text: &str) {
        self.emit(text);
    }

    fn status_message(&mut self, status: StatusCode) {
        self.emit(&format!("{status}\r\n"));
    }

    fn feedback_message(&mut self, message: Message) {
        self.emit(&format!("[MSG:{}]\r\n", message.text()));
    }
}
