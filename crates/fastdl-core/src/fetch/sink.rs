//! Response body sink: lazy file creation, optional bzip2 decoding, and
//! atomic finalize from a `.part` file.

use super::bz2::Bz2Writer;
use super::status::{HttpStatusKind, ResponseHead};
use crate::error::FetchError;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const BUF_SIZE: usize = 64 * 1024;

/// Path for the temp file: appends `.part` to the final path.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(".part");
    PathBuf::from(o)
}

enum Output {
    Raw(BufWriter<File>),
    Bz2(Bz2Writer<BufWriter<File>>),
}

impl Output {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Output::Raw(w) => w.write_all(data),
            Output::Bz2(d) => d.write_all(data),
        }
    }

    fn finish(self) -> io::Result<File> {
        let mut w = match self {
            Output::Raw(w) => w,
            Output::Bz2(d) => d.finish()?,
        };
        w.flush()?;
        w.into_inner().map_err(|e| e.into_error())
    }
}

enum SinkState {
    /// No body byte seen yet for the current response.
    Idle,
    Writing(Output),
    /// Body of a response we do not keep (redirect or error status).
    Discarding,
    /// A `.bz2` request answered with an uncompressed payload; the transfer is stopped.
    Uncompressed,
}

/// Failure raised from inside a curl callback, surfaced after `perform`.
#[derive(Debug)]
pub(super) enum SinkFailure {
    Write(PathBuf, io::Error),
    Decompress(io::Error),
}

impl SinkFailure {
    fn from_io(target: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => SinkFailure::Decompress(e),
            _ => SinkFailure::Write(temp_path(target), e),
        }
    }

    pub(super) fn into_fetch_error(self, url: &str) -> FetchError {
        match self {
            SinkFailure::Write(path, source) => FetchError::Write { path, source },
            SinkFailure::Decompress(source) => FetchError::Decompress {
                url: url.to_string(),
                source,
            },
        }
    }
}

/// What a successful response turned into.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Finished {
    Written { path: PathBuf, bytes: u64 },
    NotCompressed,
}

pub(super) struct BodySink {
    target: PathBuf,
    compressed: bool,
    head: ResponseHead,
    state: SinkState,
    failure: Option<SinkFailure>,
}

impl BodySink {
    /// `target` is the final destination (already stripped of `.bz2` when `compressed`).
    pub(super) fn new(target: PathBuf, compressed: bool) -> Self {
        Self {
            target,
            compressed,
            head: ResponseHead::default(),
            state: SinkState::Idle,
            failure: None,
        }
    }

    pub(super) fn header(&mut self, raw: &[u8]) {
        if self.head.push_line(raw) && matches!(self.state, SinkState::Discarding) {
            // An interim response was skipped; the next one starts fresh.
            self.state = SinkState::Idle;
        }
    }

    /// Consumes one body chunk. Returns the number of bytes taken; anything
    /// short of `data.len()` makes curl abort the transfer.
    pub(super) fn write(&mut self, data: &[u8]) -> usize {
        if matches!(self.state, SinkState::Idle) {
            match self.begin() {
                Ok(state) => self.state = state,
                Err(f) => {
                    self.failure = Some(f);
                    return 0;
                }
            }
        }
        match &mut self.state {
            SinkState::Writing(out) => match out.write_all(data) {
                Ok(()) => data.len(),
                Err(e) => {
                    self.failure = Some(SinkFailure::from_io(&self.target, e));
                    0
                }
            },
            SinkState::Discarding | SinkState::Idle => data.len(),
            SinkState::Uncompressed => 0,
        }
    }

    fn begin(&self) -> Result<SinkState, SinkFailure> {
        if self.head.kind() != HttpStatusKind::Success {
            return Ok(SinkState::Discarding);
        }
        if self.compressed && self.head.declares_uncompressed() {
            tracing::debug!(
                target = %self.target.display(),
                "origin says payload is not compressed; skipping"
            );
            return Ok(SinkState::Uncompressed);
        }
        let tmp = temp_path(&self.target);
        if let Some(parent) = tmp.parent() {
            fs::create_dir_all(parent).map_err(|e| SinkFailure::Write(parent.to_path_buf(), e))?;
        }
        let file = File::create(&tmp).map_err(|e| SinkFailure::Write(tmp.clone(), e))?;
        let w = BufWriter::with_capacity(BUF_SIZE, file);
        Ok(SinkState::Writing(if self.compressed {
            Output::Bz2(Bz2Writer::new(w))
        } else {
            Output::Raw(w)
        }))
    }

    /// True once the payload was found to be uncompressed and refused.
    pub(super) fn refused_uncompressed(&self) -> bool {
        matches!(self.state, SinkState::Uncompressed)
    }

    pub(super) fn take_failure(&mut self) -> Option<SinkFailure> {
        self.failure.take()
    }

    #[cfg(test)]
    pub(super) fn head(&self) -> &ResponseHead {
        &self.head
    }

    /// Completes a successful response: flushes, decodes the tail of the
    /// stream and renames the `.part` file into place. An empty body still
    /// produces an (empty) file.
    pub(super) fn finish(mut self) -> Result<Finished, SinkFailure> {
        if matches!(self.state, SinkState::Idle) {
            self.state = self.begin()?;
        }
        let tmp = temp_path(&self.target);
        match std::mem::replace(&mut self.state, SinkState::Idle) {
            SinkState::Writing(out) => {
                let file = out.finish().map_err(|e| {
                    let _ = fs::remove_file(&tmp);
                    SinkFailure::from_io(&self.target, e)
                })?;
                let bytes = file.metadata().map(|m| m.len()).unwrap_or(0);
                drop(file);
                fs::rename(&tmp, &self.target)
                    .map_err(|e| SinkFailure::Write(self.target.clone(), e))?;
                Ok(Finished::Written {
                    path: self.target.clone(),
                    bytes,
                })
            }
            SinkState::Uncompressed | SinkState::Discarding | SinkState::Idle => {
                Ok(Finished::NotCompressed)
            }
        }
    }

    /// Drops any partial output.
    pub(super) fn abandon(mut self) {
        if let SinkState::Writing(out) = std::mem::replace(&mut self.state, SinkState::Idle) {
            drop(out);
            let _ = fs::remove_file(temp_path(&self.target));
        }
    }
}
