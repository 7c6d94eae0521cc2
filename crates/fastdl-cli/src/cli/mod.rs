//! CLI for fastdl.

mod commands;
mod privilege;
mod reporter;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use fastdl_core::config::{self, Overrides};
use std::path::PathBuf;

use commands::{run_check, run_completions, run_config, run_engine, RunFlags};

/// Top-level CLI for fastdl.
#[derive(Debug, Parser)]
#[command(name = "fastdl")]
#[command(
    about = "fastdl: fetch server content the game client could not download itself",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Watch the console log and fetch files the client gave up on.
    Run {
        /// Console log written by the game client (overrides config).
        #[arg(long, value_name = "PATH")]
        log: Option<PathBuf>,

        /// Directory downloaded files are written under (overrides config).
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,

        /// Replace the log with a named pipe.
        #[arg(long, conflicts_with = "no_fifo")]
        fifo: bool,

        /// Use a plain log file (removes a pipe left by an earlier --fifo run).
        #[arg(long)]
        no_fifo: bool,

        /// Process what the log already contains, then exit (plain file only).
        #[arg(long)]
        once: bool,

        /// Store --log, --dest and the pipe choice in config.toml.
        #[arg(long)]
        save: bool,
    },

    /// Check relative paths against the download policy.
    Check {
        /// Relative paths as a server would announce them.
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Show the config file location and contents.
    Config,

    /// Print shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                log,
                dest,
                fifo,
                no_fifo,
                once,
                save,
            } => {
                let mut cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let overrides = Overrides {
                    log_path: log,
                    download_dir: dest,
                    fifo: fifo_override(fifo, no_fifo),
                };
                run_engine(&mut cfg, &overrides, RunFlags { once, save })?;
            }
            CliCommand::Check { paths } => run_check(&paths)?,
            CliCommand::Config => run_config()?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

fn fifo_override(fifo: bool, no_fifo: bool) -> Option<bool> {
    match (fifo, no_fifo) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
