// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Streaming job controller tying file session, redirection and commands together.
// Author: Lukas Bower

//! Streaming job controller.
//!
//! The firmware main loop owns one [`JobController`] and calls it in place of
//! the console's hooks: [`JobController::read`] for the next character,
//! [`JobController::status_message`] and [`JobController::feedback_message`]
//! after each executed line, [`JobController::dispatch`] for `$F` commands
//! and [`JobController::reset`] from the reset path. The active
//! [`ChannelSet`] decides where each call goes.

use core::fmt::{self, Write};

use heapless::String as HeaplessString;

use crate::admission::{classify, FilenameStatus};
use crate::command::{parse_command, SdCommand};
use crate::config::StreamConfig;
use crate::console::ConsoleChannel;
use crate::error::JobError;
use crate::redirect::{ChannelKind, ChannelSet, HookRoute, JobState, ReadSource};
use crate::scan::{self, ScanBuffer};
use crate::session::FileSession;
use crate::state::MachineState;
use crate::status::{Message, StatusCode};
use crate::storage::Storage;

/// Capacity of a single formatted job report line.
const REPORT_CAPACITY: usize = 96;

type Report = HeaplessString<REPORT_CAPACITY>;

/// Owns the card, the console and the single streaming job.
pub struct JobController<S: Storage, C: ConsoleChannel> {
    storage: S,
    volume: Option<S::Volume>,
    console: C,
    session: FileSession<S>,
    state: JobState,
    config: StreamConfig,
    scan_buffer: ScanBuffer,
}

impl<S: Storage, C: ConsoleChannel> JobController<S, C> {
    /// Create an idle controller with the console set active.
    pub fn new(storage: S, console: C, config: StreamConfig) -> Self {
        Self {
            storage,
            volume: None,
            console,
            session: FileSession::new(),
            state: JobState::Idle,
            config,
            scan_buffer: ScanBuffer::new(),
        }
    }

    /// Current job state.
    #[must_use]
    pub fn job_state(&self) -> JobState {
        self.state
    }

    /// Channel set currently installed.
    #[must_use]
    pub fn active_channel(&self) -> ChannelSet {
        self.state.active()
    }

    /// Channel set saved when the running job started.
    #[must_use]
    pub fn saved_channel(&self) -> Option<ChannelSet> {
        self.state.saved()
    }

    /// Whether full program lines from the console are refused.
    #[must_use]
    pub fn input_blocked(&self) -> bool {
        self.state.active().blocks_program_input()
    }

    /// Program file accounting.
    #[must_use]
    pub fn session(&self) -> &FileSession<S> {
        &self.session
    }

    /// Mounted volume work area, if any.
    #[must_use]
    pub fn volume(&self) -> Option<&S::Volume> {
        self.volume.as_ref()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Console collaborator.
    #[must_use]
    pub fn console(&self) -> &C {
        &self.console
    }

    /// Console collaborator, mutably.
    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// Storage collaborator.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Storage collaborator, mutably.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Tear the controller down, closing any open program.
    pub fn into_parts(mut self) -> (S, C) {
        self.end_job();
        (self.storage, self.console)
    }

    /// Read hook: next character for the interpreter.
    ///
    /// `machine` is the executor state at the time of the read.
    pub fn read(&mut self, machine: MachineState) -> Option<u8> {
        match self.state.active().read_source() {
            ReadSource::Console => self.console.read(),
            ReadSource::Program => self.read_program(machine),
        }
    }

    fn read_program(&mut self, machine: MachineState) -> Option<u8> {
        self.session.account_line();

        if !self.session.is_open() {
            // Completion: file exhausted and the executor has drained.
            if machine.is_idle() {
                log::info!(
                    "[sdcard] program complete after {} lines",
                    self.session.line_number()
                );
                self.end_job();
            }
            return None;
        }

        let byte = if machine.accepts_program_input() {
            self.session.read_byte(&mut self.storage)
        } else {
            log::warn!(
                "[sdcard] machine state {machine:?} stops program at line {}",
                self.session.line_in_progress()
            );
            self.session.close(&mut self.storage);
            None
        };
        byte.or_else(|| self.session.terminate_line())
    }

    /// Reset-read-buffer hook.
    pub fn reset_read_buffer(&mut self) {
        self.console.reset_read_buffer();
    }

    /// Suspend-read hook.
    ///
    /// `true` parks the job and hands input and status back to the console;
    /// `false` resumes reading the program. Returns `false` when no job
    /// exists, as the console set carries no suspend handler.
    pub fn suspend_read(&mut self, suspend: bool) -> bool {
        if !self.state.active().has_suspend_handler() {
            return false;
        }
        if suspend {
            self.state.suspend();
            self.console.reset_read_buffer();
            log::info!(
                "[sdcard] suspended at line {} offset {}",
                self.session.line_in_progress(),
                self.session.position()
            );
        } else {
            self.state.resume();
            log::info!(
                "[sdcard] resumed at line {} offset {}",
                self.session.line_in_progress(),
                self.session.position()
            );
        }
        self.console.block_program_input(self.input_blocked());
        true
    }

    /// Status hook, called by the interpreter after each executed line.
    ///
    /// While streaming, success is swallowed and any failure ends the job
    /// after reporting the failing line.
    pub fn status_message(&mut self, status: StatusCode) {
        match self.state.active().status_route() {
            HookRoute::Forward => self.console.status_message(status),
            HookRoute::Trap => {
                if status.is_ok() {
                    return;
                }
                let line = self.session.line_in_progress();
                log::warn!("[sdcard] {status} at line {line}, aborting job");
                self.report(format_args!(
                    "error:{} in SD file at line {}\r\n",
                    status.code(),
                    line
                ));
                self.end_job();
            }
        }
    }

    /// Feedback hook. A program end ends the job once reported.
    pub fn feedback_message(&mut self, message: Message) {
        self.console.feedback_message(message);
        if self.state.active().feedback_route() == HookRoute::Trap && message == Message::ProgramEnd
        {
            log::info!(
                "[sdcard] program end at line {}",
                self.session.line_in_progress()
            );
            self.end_job();
        }
    }

    /// Append the `|SD:<percent>` fragment to a real-time status report
    /// while a job exists.
    pub fn realtime_report<W: Write>(&self, out: &mut W) -> fmt::Result {
        if !self.state.is_active() {
            return Ok(());
        }
        write!(out, "|SD:{:.1}", self.session.progress() * 100.0)
    }

    /// Reset notification from the firmware reset path.
    pub fn reset(&mut self) {
        if self.state.active().kind() != ChannelKind::Storage {
            return;
        }
        let line = self.session.line_in_progress();
        log::warn!("[sdcard] reset during job at line {line}");
        self.report(format_args!(
            "[MSG:Reset during streaming of SD file at line: {line}]\r\n"
        ));
        self.end_job();
    }

    /// System command hook: handle a `$F` line and return its status.
    ///
    /// Lines outside the family yield [`StatusCode::Unhandled`].
    pub fn dispatch(&mut self, line: &str, machine: MachineState) -> StatusCode {
        match parse_command(line) {
            Ok(None) => StatusCode::Unhandled,
            Ok(Some(command)) => match self.execute(command, machine) {
                Ok(()) => StatusCode::Ok,
                Err(err) => {
                    log::debug!("[sdcard] {line:?} failed: {err}");
                    err.status()
                }
            },
            Err(err) => err.status(),
        }
    }

    /// Execute a parsed `$F` command.
    pub fn execute(&mut self, command: SdCommand<'_>, machine: MachineState) -> Result<(), JobError> {
        match command {
            SdCommand::List => self.list(),
            SdCommand::Mount => self.mount(),
            SdCommand::Run(path) => self.run(path, machine),
        }
    }

    /// List admitted files on the card to the console.
    pub fn list(&mut self) -> Result<(), JobError> {
        let console = &mut self.console;
        scan::list(
            &mut self.storage,
            &self.config,
            "",
            self.config.scan_depth(),
            &mut self.scan_buffer,
            &mut |record: &str| console.write(record),
        )?;
        Ok(())
    }

    /// Mount the card. The volume work area is created on first use, kept
    /// across repeated mounts and dropped if a mount fails.
    pub fn mount(&mut self) -> Result<(), JobError> {
        let volume = self.volume.get_or_insert_with(S::Volume::default);
        match self.storage.mount(volume) {
            Ok(()) => {
                log::info!("[sdcard] card mounted");
                Ok(())
            }
            Err(err) => {
                log::warn!("[sdcard] mount failed: {err}");
                self.volume = None;
                Err(JobError::Mount(err))
            }
        }
    }

    /// Open `path` and start streaming it in place of the console.
    ///
    /// The originator is acknowledged with `ok` before the switch so the
    /// acknowledgment still travels over the console's status hook.
    pub fn run(&mut self, path: &str, machine: MachineState) -> Result<(), JobError> {
        if !machine.is_idle() {
            return Err(JobError::Busy);
        }
        let name = path.rsplit('/').next().unwrap_or(path);
        if classify(&self.config, name, true) != FilenameStatus::Valid {
            log::warn!("[sdcard] refusing unusable program name {path}");
            return Err(JobError::UnusableName);
        }
        if let Err(err) = self.session.open(&mut self.storage, path) {
            log::warn!("[sdcard] cannot open {path}: {err}");
            if self.state.is_active() {
                // The previous program was closed by the failed open.
                self.end_job();
            }
            return Err(JobError::Open(err));
        }

        self.status_message(StatusCode::Ok);
        self.state.redirect();
        self.console.block_program_input(true);
        log::info!(
            "[sdcard] streaming {path} ({} bytes)",
            self.session.size()
        );
        Ok(())
    }

    fn end_job(&mut self) {
        self.session.close(&mut self.storage);
        let Some(restored) = self.state.restore() else {
            return;
        };
        self.console.reset_read_buffer();
        self.console.block_program_input(false);
        log::debug!("[sdcard] job ended, {restored:?} channel set restored");
    }

    fn report(&mut self, args: fmt::Arguments<'_>) {
        let mut text = Report::new();
        if text.write_fmt(args).is_err() {
            log::warn!("[sdcard] report truncated to {REPORT_CAPACITY} bytes");
        }
        self.console.write(&text);
    }
}
