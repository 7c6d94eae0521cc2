//! `fastdl run` – follow the console log and fetch what the client gives up on.

use anyhow::{Context, Result};
use fastdl_core::config::{self, FastdlConfig, Overrides, RunSettings};
use fastdl_core::engine::Engine;
use fastdl_core::fetch::Fetcher;
use fastdl_core::tailer::{self, TailOptions};
use std::path::Path;

use crate::cli::privilege;
use crate::cli::reporter::ConsoleReporter;

/// Switches of `fastdl run` that are not stored in the config.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    pub once: bool,
    pub save: bool,
}

pub fn run_engine(cfg: &mut FastdlConfig, overrides: &Overrides, flags: RunFlags) -> Result<()> {
    privilege::ensure_not_root()?;

    let settings = settle(cfg, overrides, flags, &config::config_path()?)?;

    let opts = TailOptions {
        fifo: settings.fifo,
        follow: !flags.once,
        poll_interval: settings.poll_interval,
    };
    let mut source = tailer::open(&settings.log_path, opts)
        .with_context(|| format!("open console log {}", settings.log_path.display()))?;

    tracing::info!(
        log = %settings.log_path.display(),
        dest = %settings.download_dir.display(),
        fifo = settings.fifo,
        "engine started"
    );
    println!(
        "watching {} (downloads go to {})",
        settings.log_path.display(),
        settings.download_dir.display()
    );

    let mut engine = Engine::new(Fetcher::new(), &settings.download_dir);
    let mut reporter = ConsoleReporter::new(std::io::stdout());
    let lines = engine.run(&mut source, &mut reporter)?;
    println!("console log closed after {} line(s)", lines);
    Ok(())
}

/// Applies `overrides`, checks the result and only then writes it to
/// `config_file` when `--save` was given.
fn settle(
    cfg: &mut FastdlConfig,
    overrides: &Overrides,
    flags: RunFlags,
    config_file: &Path,
) -> Result<RunSettings> {
    cfg.apply(overrides);
    let settings = cfg.resolve()?;
    if flags.once && settings.fifo {
        anyhow::bail!("--once reads a plain log file; it cannot be combined with --fifo");
    }
    if flags.save {
        cfg.save_to(config_file)?;
        println!("saved settings to {}", config_file.display());
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn overrides(fifo: bool) -> Overrides {
        Overrides {
            log_path: Some(PathBuf::from("/games/tf/console.log")),
            download_dir: Some(PathBuf::from("/games/tf/download")),
            fifo: Some(fifo),
        }
    }

    #[test]
    fn rejected_flags_leave_config_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        let mut cfg = FastdlConfig::default();
        let flags = RunFlags {
            once: true,
            save: true,
        };
        assert!(settle(&mut cfg, &overrides(true), flags, &file).is_err());
        assert!(!file.exists());
    }

    #[test]
    fn unresolved_settings_are_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        let mut cfg = FastdlConfig::default();
        let only_log = Overrides {
            log_path: Some(PathBuf::from("console.log")),
            ..Overrides::default()
        };
        let flags = RunFlags {
            once: false,
            save: true,
        };
        assert!(settle(&mut cfg, &only_log, flags, &file).is_err());
        assert!(!file.exists());
    }

    #[test]
    fn save_writes_effective_settings() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        let mut cfg = FastdlConfig::default();
        let flags = RunFlags {
            once: false,
            save: true,
        };
        let settings = settle(&mut cfg, &overrides(true), flags, &file).unwrap();
        assert!(settings.fifo);
        assert_eq!(config::load_or_init_at(&file).unwrap(), cfg);
    }
}
