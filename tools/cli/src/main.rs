// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Host driver listing and streaming g-code programs from a card directory.
// Author: Lukas Bower

mod config;
mod console;
mod runner;

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::LevelFilter;
use sdstream::host::HostStorage;
use sdstream::{JobController, MachineState, StreamConfig};

use crate::console::WriterConsole;

#[derive(Debug, Parser)]
#[command(author = "Lukas Bower", version, about = "SD-card program streamer", long_about = None)]
struct Cli {
    /// Host directory presented as the card root.
    #[arg(long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Streaming configuration TOML.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List admitted program files.
    List,
    /// Stream a program through the host line executor.
    Run {
        /// Card path of the program, e.g. `/jobs/part.nc`.
        path: String,

        /// Print a status report after every line.
        #[arg(long)]
        progress: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.config.as_deref() {
        Some(path) => config::load_config(path)?,
        None => StreamConfig::default(),
    };
    let storage = HostStorage::new(cli.root);
    let console = WriterConsole::new(io::stdout().lock());
    let mut jobs = JobController::new(storage, console, config);

    let status = jobs.dispatch("$FM", MachineState::IDLE);
    if !status.is_ok() {
        jobs.status_message(status);
        bail!("cannot mount {}", jobs.storage().root().display());
    }

    match cli.command {
        Command::List => {
            let status = jobs.dispatch("$F", MachineState::IDLE);
            jobs.status_message(status);
            if !status.is_ok() {
                bail!("listing failed: {status}");
            }
        }
        Command::Run { path, progress } => {
            let summary = runner::run_program(&mut jobs, &path, progress)?;
            log::info!(
                "streamed {path}: {} lines, {} errors",
                summary.lines,
                summary.errors
            );
            if summary.errors > 0 {
                bail!("{path} stopped at an error");
            }
        }
    }
    Ok(())
}
