//! Push-style bzip2 decoding into a writer.

use bzip2::{Decompress, Status};
use std::io::{self, Write};

const OUT_CHUNK: usize = 64 * 1024;

fn corrupt(e: bzip2::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

/// Decodes a bzip2 stream fed in arbitrary chunks and writes the plain bytes
/// to `inner`. Decoder failures surface as `InvalidData` / `UnexpectedEof`,
/// anything else comes from `inner`.
pub struct Bz2Writer<W> {
    inner: W,
    dec: Decompress,
    buf: Vec<u8>,
    done: bool,
}

impl<W: Write> Bz2Writer<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            dec: Decompress::new(false),
            buf: Vec::with_capacity(OUT_CHUNK),
            done: false,
        }
    }

    /// Runs the decoder once over `input` and flushes its output.
    /// Returns how much input was consumed and how much output was produced.
    fn step(&mut self, input: &[u8]) -> io::Result<(usize, usize)> {
        self.buf.clear();
        let before = self.dec.total_in();
        let status = self
            .dec
            .decompress_vec(input, &mut self.buf)
            .map_err(corrupt)?;
        let consumed = (self.dec.total_in() - before) as usize;
        self.inner.write_all(&self.buf)?;
        if status == Status::StreamEnd {
            self.done = true;
        }
        Ok((consumed, self.buf.len()))
    }

    pub fn write_all(&mut self, mut data: &[u8]) -> io::Result<()> {
        // Bytes after the end of the stream are ignored.
        while !data.is_empty() && !self.done {
            let (consumed, produced) = self.step(data)?;
            if consumed == 0 && produced == 0 && !self.done {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "bzip2 decoder made no progress",
                ));
            }
            data = &data[consumed..];
        }
        Ok(())
    }

    /// Drains buffered output; fails if the stream ended early.
    pub fn finish(mut self) -> io::Result<W> {
        while !self.done {
            let (_, produced) = self.step(&[])?;
            if produced == 0 && !self.done {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated bzip2 stream",
                ));
            }
        }
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bzip2::write::BzEncoder;
    use bzip2::Compression;

    fn pack(data: &[u8]) -> Vec<u8> {
        let mut enc = BzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn decodes_across_odd_chunk_sizes() {
        let plain: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        let packed = pack(&plain);
        let mut w = Bz2Writer::new(Vec::new());
        for chunk in packed.chunks(777) {
            w.write_all(chunk).unwrap();
        }
        assert_eq!(w.finish().unwrap(), plain);
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let plain = b"the quick brown fox ".repeat(500);
        let packed = pack(&plain);
        let mut w = Bz2Writer::new(Vec::new());
        w.write_all(&packed[..packed.len() / 2]).unwrap();
        let err = w.finish().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn garbage_is_invalid_data() {
        let mut w = Bz2Writer::new(Vec::new());
        let err = w.write_all(b"definitely not bzip2").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
