use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default poll interval for tailing a plain log file.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Global configuration loaded from `~/.config/fastdl/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastdlConfig {
    /// Console log written by the game client (e.g. `tf/console.log`).
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    /// Root the fetched files are written under (e.g. `tf/download`).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Replace the log with a named pipe so every line is seen as it is written.
    #[serde(default)]
    pub fifo: bool,
    /// How often a plain log file is re-checked for growth, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for FastdlConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            download_dir: None,
            fifo: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Values given on the command line; each one wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_path: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    pub fifo: Option<bool>,
}

/// Fully resolved settings for one run of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub log_path: PathBuf,
    pub download_dir: PathBuf,
    pub fifo: bool,
    pub poll_interval: Duration,
}

impl FastdlConfig {
    /// Applies `overrides` on top of this config (in place).
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(p) = &overrides.log_path {
            self.log_path = Some(p.clone());
        }
        if let Some(d) = &overrides.download_dir {
            self.download_dir = Some(d.clone());
        }
        if let Some(f) = overrides.fifo {
            self.fifo = f;
        }
    }

    /// Returns the settings for a run, failing when a required path is still unknown.
    pub fn resolve(&self) -> Result<RunSettings> {
        let log_path = self
            .log_path
            .clone()
            .context("no console log configured; pass --log or set log_path in config.toml")?;
        let download_dir = self.download_dir.clone().context(
            "no download directory configured; pass --dest or set download_dir in config.toml",
        )?;
        Ok(RunSettings {
            log_path,
            download_dir,
            fifo: self.fifo,
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes this config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let toml = self.to_toml_string()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// Writes this config to the default location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = config_path()?;
        self.save_to(&path)?;
        tracing::info!("saved config to {}", path.display());
        Ok(path)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fastdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FastdlConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`] but against an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<FastdlConfig> {
    if !path.exists() {
        let default_cfg = FastdlConfig::default();
        default_cfg.save_to(path)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: FastdlConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
