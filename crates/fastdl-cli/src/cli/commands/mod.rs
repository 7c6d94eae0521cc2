//! CLI command handlers, one file per command.

mod check;
mod completions;
mod config;
mod run;

pub use check::run_check;
pub use completions::run_completions;
pub use config::run_config;
pub use run::{run_engine, RunFlags};
