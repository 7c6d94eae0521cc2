//! The engine loop: log line → event → path check → fetch.
//!
//! Everything runs on the caller's thread, one line and one fetch at a time,
//! so two fetches never race on the same destination.

use crate::error::Result;
use crate::event::{classify, LogEvent, SessionContext};
use crate::fetch::{FetchOutcome, Fetcher};
use crate::tailer::LineSource;
use crate::validate::validate;
use std::path::PathBuf;

/// Hooks for progress output. All methods default to doing nothing.
pub trait Reporter {
    fn connected(&mut self, _endpoint: &str) {}
    fn fetch_started(&mut self, _rel_path: &str) {}
    fn fetch_finished(&mut self, _rel_path: &str, _outcome: &FetchOutcome) {}
    /// Every download of the current load has been handled.
    fn all_loaded(&mut self) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Default)]
pub struct Silent;

impl Reporter for Silent {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No server endpoint known.
    Idle,
    Connected,
    /// At least one fetch started since the last completion signal.
    Downloading,
}

pub struct Engine {
    fetcher: Fetcher,
    dest_root: PathBuf,
    ctx: SessionContext,
    all_loaded: bool,
}

impl Engine {
    pub fn new(fetcher: Fetcher, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            dest_root: dest_root.into(),
            ctx: SessionContext::default(),
            all_loaded: true,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn all_loaded(&self) -> bool {
        self.all_loaded
    }

    pub fn state(&self) -> EngineState {
        if !self.all_loaded {
            EngineState::Downloading
        } else if self.ctx.endpoint.is_some() {
            EngineState::Connected
        } else {
            EngineState::Idle
        }
    }

    /// Processes one log line. Any error is fatal for the run.
    pub fn feed_line(&mut self, line: &str, reporter: &mut dyn Reporter) -> Result<()> {
        let ctx = std::mem::take(&mut self.ctx);
        let (event, ctx) = classify(line, ctx, self.all_loaded)?;
        self.ctx = ctx;

        let Some(event) = event else {
            return Ok(());
        };
        tracing::debug!(?event, "log event");

        match event {
            LogEvent::Connected { endpoint } => reporter.connected(&endpoint),
            LogEvent::DownloadAnnounced { .. } => {}
            LogEvent::DownloadAborted { rel_path } | LogEvent::DownloadDiscarded { rel_path } => {
                self.all_loaded = false;
                validate(&rel_path)?;
                let server = self.ctx.server()?;
                reporter.fetch_started(&rel_path);
                let outcome = self.fetcher.fetch(&rel_path, server, &self.dest_root)?;
                reporter.fetch_finished(&rel_path, &outcome);
            }
            LogEvent::UiStateChanged => {
                self.all_loaded = true;
                tracing::info!("all downloads handled");
                reporter.all_loaded();
            }
        }
        Ok(())
    }

    /// Feeds lines from `source` until it ends. Returns the number of lines read.
    pub fn run<S: LineSource + ?Sized>(
        &mut self,
        source: &mut S,
        reporter: &mut dyn Reporter,
    ) -> Result<u64> {
        let mut lines = 0u64;
        while let Some(line) = source.next_line()? {
            lines += 1;
            self.feed_line(&line, reporter)?;
        }
        tracing::info!(lines, "log source ended");
        Ok(lines)
    }
}
