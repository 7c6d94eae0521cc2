//! Line sources over the client's console log.
//!
//! The log is either a plain file the client keeps appending to, or a named
//! pipe the client writes into. Which one is used is decided once at startup
//! by [`reconcile`], which also fixes up whatever node is on disk.

mod file;
mod pipe;

use crate::error::TailerError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use file::FileTailer;
pub use pipe::ReaderLines;

/// A blocking, non-restartable sequence of log lines.
pub trait LineSource {
    /// Blocks until the next complete line is available. `None` ends the sequence.
    fn next_line(&mut self) -> Result<Option<String>, TailerError>;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn next_line(&mut self) -> Result<Option<String>, TailerError> {
        (**self).next_line()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailOptions {
    /// Read through a named pipe instead of a plain file.
    pub fifo: bool,
    /// Keep waiting for growth at end of a plain file. When false the file is
    /// read once from the start and the source ends at its current end.
    pub follow: bool,
    /// How long to sleep between growth checks of a plain file.
    pub poll_interval: Duration,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            fifo: false,
            follow: true,
            poll_interval: Duration::from_millis(crate::config::DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// Reconciles the node at `path` with `opts.fifo` and opens the matching source.
pub fn open(path: &Path, opts: TailOptions) -> Result<Box<dyn LineSource>, TailerError> {
    reconcile(path, opts.fifo)?;
    if opts.fifo {
        tracing::info!(path = %path.display(), "waiting for writer on named pipe");
        Ok(Box::new(pipe::open_pipe(path)?))
    } else {
        Ok(Box::new(FileTailer::open(path, opts.follow, opts.poll_interval)?))
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Makes the node at `path` a named pipe (`fifo == true`) or removes a stale
/// pipe so the client goes back to writing a plain file (`fifo == false`).
pub fn reconcile(path: &Path, fifo: bool) -> Result<(), TailerError> {
    if !parent_dir(path).is_dir() {
        return Err(TailerError::MissingParent(path.to_path_buf()));
    }

    let meta = fs::symlink_metadata(path).ok();
    let is_pipe = meta.as_ref().map(pipe::is_fifo).unwrap_or(false);

    if fifo {
        if is_pipe {
            return Ok(());
        }
        if meta.is_some() {
            remove(path)?;
            tracing::info!(path = %path.display(), "removed plain log to make room for pipe");
        }
        pipe::make_fifo(path).map_err(|source| TailerError::CreatePipe {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "created named pipe");
    } else if is_pipe {
        remove(path)?;
        tracing::info!(path = %path.display(), "removed named pipe; client will write a plain log");
    }
    Ok(())
}

fn remove(path: &Path) -> Result<(), TailerError> {
    fs::remove_file(path).map_err(|source| TailerError::Remove {
        path: PathBuf::from(path),
        source,
    })
}
