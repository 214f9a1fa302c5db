// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Drive a streaming job through a minimal host-side line executor.
// Author: Lukas Bower

use std::io::Write;

use anyhow::{bail, Result};
use sdstream::{ConsoleChannel, JobController, MachineState, Message, StatusCode, Storage};

use crate::console::WriterConsole;

/// Expected command letter.
const STATUS_EXPECTED_COMMAND_LETTER: u8 = 1;
/// Bad number format.
const STATUS_BAD_NUMBER_FORMAT: u8 = 2;

type Jobs<S, W> = JobController<S, WriterConsole<W>>;

/// Outcome of streaming one program.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines handed to the executor.
    pub lines: u32,
    /// Lines that failed to execute.
    pub errors: u32,
}

/// Start `path` and execute it until the job ends.
///
/// The host has no motion planner, so the machine is always idle and every
/// well-formed line succeeds immediately.
pub fn run_program<S, W>(jobs: &mut Jobs<S, W>, path: &str, progress: bool) -> Result<RunSummary>
where
    S: Storage,
    W: Write,
{
    let mut command = String::from("$F=");
    command.push_str(path);
    let status = jobs.dispatch(&command, MachineState::IDLE);
    if !status.is_ok() {
        jobs.status_message(status);
        bail!("cannot start {path}: {status}");
    }

    let mut summary = RunSummary::default();
    let mut line = String::new();
    let mut empty_reads = 0;
    while jobs.job_state().is_active() {
        // The controller notices completion on the read after the file closes.
        let Some(byte) = jobs.read(MachineState::IDLE) else {
            empty_reads += 1;
            if empty_reads > 1 && jobs.job_state().is_active() {
                bail!("program stalled at line {}", jobs.session().line_in_progress());
            }
            continue;
        };
        empty_reads = 0;
        match byte {
            b'\r' | b'\n' if line.is_empty() => continue,
            b'\r' | b'\n' => {}
            other => {
                line.push(char::from(other));
                continue;
            }
        }

        summary.lines += 1;
        if !execute_line(jobs, line.trim()) {
            summary.errors += 1;
        }
        line.clear();

        if progress {
            let mut report = String::from("<Idle");
            if jobs.realtime_report(&mut report).is_ok() {
                report.push_str(">\r\n");
                jobs.console_mut().write(&report);
            }
        }
    }
    Ok(summary)
}

/// Execute one line and report through the controller's hooks.
/// Returns `false` when the line failed.
fn execute_line<S, W>(jobs: &mut Jobs<S, W>, line: &str) -> bool
where
    S: Storage,
    W: Write,
{
    if line.starts_with('$') {
        let status = match jobs.dispatch(line, MachineState::IDLE) {
            StatusCode::Unhandled => StatusCode::InvalidStatement,
            status => status,
        };
        jobs.status_message(status);
        return status.is_ok();
    }

    let status = match check_words(line) {
        Ok(program_end) => {
            if program_end {
                jobs.feedback_message(Message::ProgramEnd);
            }
            StatusCode::Ok
        }
        Err(code) => StatusCode::from_code(code),
    };
    jobs.status_message(status);
    status.is_ok()
}

/// Validate the word structure of a g-code line.
///
/// Returns whether the line ends the program (`M2` or `M30`).
fn check_words(line: &str) -> Result<bool, u8> {
    let code = line
        .split([';', '('])
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    let mut program_end = false;
    let mut chars = code.chars().filter(|ch| !ch.is_whitespace()).peekable();
    while let Some(letter) = chars.next() {
        if !letter.is_ascii_alphabetic() {
            return Err(STATUS_EXPECTED_COMMAND_LETTER);
        }
        let mut number = String::new();
        while let Some(&ch) = chars.peek() {
            if ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+') {
                number.push(ch);
                chars.next();
            } else {
                break;
            }
        }
        let value: f32 = number.parse().map_err(|_| STATUS_BAD_NUMBER_FORMAT)?;
        if letter == 'M' && (value == 2.0 || value == 30.0) {
            program_end = true;
        }
    }
    Ok(program_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdstream::test_support::MemStorage;
    use sdstream::StreamConfig;

    fn jobs(files: &[(&str, &[u8])]) -> Jobs<MemStorage, Vec<u8>> {
        let mut storage = MemStorage::new();
        for (path, data) in files {
            storage.add_file(path, data);
        }
        JobController::new(storage, WriterConsole::new(Vec::new()), StreamConfig::default())
    }

    fn output(jobs: Jobs<MemStorage, Vec<u8>>) -> String {
        let (_, console) = jobs.into_parts();
        String::from_utf8(console.into_inner()).expect("utf8")
    }

    #[test]
    fn word_checker_spots_program_end_and_bad_words() {
        assert_eq!(check_words("G0 X1.5 Y-2"), Ok(false));
        assert_eq!(check_words("m30 ; done"), Ok(true));
        assert_eq!(check_words("(comment only)"), Ok(false));
        assert_eq!(check_words("G0 X"), Err(STATUS_BAD_NUMBER_FORMAT));
        assert_eq!(check_words("1 G0"), Err(STATUS_EXPECTED_COMMAND_LETTER));
    }

    #[test]
    fn streams_program_to_completion() {
        let mut jobs = jobs(&[("/part.nc", b"G0 X1\r\nG1 X2 F100\r\n")]);
        let summary = run_program(&mut jobs, "/part.nc", false).expect("run");
        assert_eq!(summary, RunSummary { lines: 2, errors: 0 });
        assert!(!jobs.input_blocked());
        assert_eq!(output(jobs), "ok\r\n");
    }

    #[test]
    fn error_line_aborts_the_job() {
        let mut jobs = jobs(&[("/bad.nc", b"G0 X1\nG0 X\nG0 X3\n")]);
        let summary = run_program(&mut jobs, "/bad.nc", false).expect("run");
        assert_eq!(summary, RunSummary { lines: 2, errors: 1 });
        assert_eq!(output(jobs), "ok\r\nerror:2 in SD file at line 2\r\n");
    }

    #[test]
    fn program_end_hands_back_the_console() {
        let mut jobs = jobs(&[("/end.nc", b"G0 X1\nM30\nG0 X9\n")]);
        jobs.console_mut().queue_input("?");
        let summary = run_program(&mut jobs, "/end.nc", true).expect("run");
        assert_eq!(summary.lines, 2);
        assert_eq!(jobs.read(MachineState::IDLE), None);
        assert_eq!(
            output(jobs),
            "ok\r\n<Idle|SD:37.5>\r\n[MSG:Pgm End]\r\nok\r\n<Idle>\r\n"
        );
    }

    #[test]
    fn missing_program_fails_to_start() {
        let mut jobs = jobs(&[]);
        assert!(run_program(&mut jobs, "/none.nc", false).is_err());
        assert_eq!(output(jobs), "error:61\r\n");
    }
}
