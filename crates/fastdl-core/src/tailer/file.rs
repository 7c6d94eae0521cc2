//! Tailing a plain, growing log file.

use super::pipe::decode_line;
use super::LineSource;
use crate::error::TailerError;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Follows a plain file the way `tail -f` does.
///
/// A line is only returned once its newline has been written; a partial
/// trailing line is held back until it is complete. If the file shrinks below
/// the read position (the client truncated it on restart) reading starts over
/// from the beginning.
pub struct FileTailer {
    path: PathBuf,
    reader: BufReader<File>,
    pos: u64,
    pending: Vec<u8>,
    follow: bool,
    poll_interval: Duration,
}

impl FileTailer {
    /// Opens `path` and reads it from the start. With `follow` a missing file
    /// is created empty and reading waits for growth at the end; without it
    /// the source ends at the current end of the file.
    pub fn open(path: &Path, follow: bool, poll_interval: Duration) -> Result<Self, TailerError> {
        let open_err = |source| TailerError::Open {
            path: path.to_path_buf(),
            source,
        };
        if follow && !path.exists() {
            File::create(path).map_err(open_err)?;
        }
        let file = File::open(path).map_err(open_err)?;
        tracing::debug!(path = %path.display(), follow, "tailing log file");
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            pos: 0,
            pending: Vec::new(),
            follow,
            poll_interval,
        })
    }

    fn take_pending(&mut self) -> String {
        let line = decode_line(&self.pending);
        self.pending.clear();
        line
    }

    fn rewind_if_truncated(&mut self) -> Result<(), TailerError> {
        let len = self
            .reader
            .get_ref()
            .metadata()
            .map_err(TailerError::Read)?
            .len();
        if len < self.pos {
            tracing::info!(path = %self.path.display(), len, pos = self.pos, "log truncated; rewinding");
            self.reader
                .seek(SeekFrom::Start(0))
                .map_err(TailerError::Read)?;
            self.pos = 0;
            self.pending.clear();
        }
        Ok(())
    }
}

impl LineSource for FileTailer {
    fn next_line(&mut self) -> Result<Option<String>, TailerError> {
        loop {
            let n = self
                .reader
                .read_until(b'\n', &mut self.pending)
                .map_err(TailerError::Read)?;
            self.pos += n as u64;
            if self.pending.ends_with(b"\n") {
                return Ok(Some(self.take_pending()));
            }

            // At end of file, possibly holding a partial line.
            if !self.follow {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_pending()));
            }
            self.rewind_if_truncated()?;
            std::thread::sleep(self.poll_interval);
        }
    }
}
