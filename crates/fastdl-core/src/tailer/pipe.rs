//! Named-pipe log source and the generic reader-backed line source.

use super::LineSource;
use crate::error::TailerError;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Lines from any buffered reader; ends at EOF.
///
/// Reading a named pipe is exactly this: each read blocks until the writer
/// produces data, and EOF means the writer closed its end.
pub struct ReaderLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> ReaderLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> LineSource for ReaderLines<R> {
    fn next_line(&mut self) -> Result<Option<String>, TailerError> {
        self.buf.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(TailerError::Read)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(decode_line(&self.buf)))
    }
}

/// Decodes a raw log line, dropping the line terminator. Invalid UTF-8 is replaced.
pub(super) fn decode_line(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    s.trim_end_matches(&['\n', '\r'][..]).to_string()
}

/// Opens the pipe for reading. Blocks until a writer opens the other end.
pub(super) fn open_pipe(path: &Path) -> Result<ReaderLines<BufReader<File>>, TailerError> {
    let file = File::open(path).map_err(|source| TailerError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReaderLines::new(BufReader::new(file)))
}

#[cfg(unix)]
pub(super) fn is_fifo(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    meta.file_type().is_fifo()
}

#[cfg(not(unix))]
pub(super) fn is_fifo(_meta: &fs::Metadata) -> bool {
    false
}

#[cfg(unix)]
pub(super) fn make_fifo(path: &Path) -> io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let r = unsafe { libc::mkfifo(c_path.as_ptr(), 0o644) };
    if r != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
pub(super) fn make_fifo(_path: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "named pipes are only supported on unix",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reader_lines_strip_terminators() {
        let mut src = ReaderLines::new(Cursor::new(b"a\r\nb\n\nc".to_vec()));
        assert_eq!(src.next_line().unwrap().as_deref(), Some("a"));
        assert_eq!(src.next_line().unwrap().as_deref(), Some("b"));
        assert_eq!(src.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(src.next_line().unwrap().as_deref(), Some("c"));
        assert_eq!(src.next_line().unwrap(), None);
        assert_eq!(src.next_line().unwrap(), None);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut src = ReaderLines::new(Cursor::new(b"map \xff.bsp\n".to_vec()));
        assert_eq!(
            src.next_line().unwrap().as_deref(),
            Some("map \u{fffd}.bsp")
        );
    }
}
