//! Streaming one byte range into batches of whole records.

use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::mem;
use std::path::Path;

use crate::distributor::{Batch, BatchSink};
use crate::error::{BrcError, Result};
use crate::pipeline::StopToken;
use crate::planner::ByteRange;
use crate::splitter;

/// Totals reported by a reader once its range is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    pub bytes: u64,
    pub batches: u64,
    pub records: u64,
}

/// Reads a source block by block and cuts each block at its last newline.
///
/// Bytes after that newline stay at the front of the next buffer and the next
/// read only fills the space behind them, which is how a record split across
/// two reads is put back together. When a whole buffer holds no newline the
/// buffer doubles, up to `max_buffer`.
pub struct ChunkReader<R> {
    source: R,
    offset: u64,
    block_size: usize,
    max_buffer: usize,
}

impl ChunkReader<io::Take<File>> {
    /// Opens its own handle on `path` positioned at `range.start`.
    pub fn open(
        path: &Path,
        range: ByteRange,
        block_size: usize,
        max_buffer: usize,
    ) -> Result<Self> {
        let mut file = File::open(path).map_err(|source| BrcError::InputNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        file.seek(SeekFrom::Start(range.start))?;
        Ok(Self::new(file.take(range.len()), range.start, block_size, max_buffer))
    }
}

impl<R: Read> ChunkReader<R> {
    /// `offset` is the absolute position of the first byte `source` yields.
    pub fn new(source: R, offset: u64, block_size: usize, max_buffer: usize) -> Self {
        let block_size = block_size.max(1);
        Self {
            source,
            offset,
            block_size,
            max_buffer: max_buffer.max(block_size),
        }
    }

    /// Drains the source into `sink`.
    ///
    /// Stops early without error when `stop` is tripped or the sink stops
    /// accepting batches. Whatever is left after the last newline at the end
    /// of the source is sent as one final record.
    pub fn run<S: BatchSink>(mut self, sink: &mut S, stop: &StopToken) -> Result<ReadStats> {
        let mut stats = ReadStats::default();
        let mut buf = fresh_buffer(sink, self.block_size);
        // Valid bytes at the front of `buf` left over from the previous read.
        let mut tail = 0;
        let mut ends = Vec::new();

        loop {
            if stop.is_stopped() {
                return Ok(stats);
            }
            if tail == buf.len() {
                self.grow(&mut buf)?;
            }
            let n = match self.source.read(&mut buf[tail..]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            stats.bytes += n as u64;
            let filled = tail + n;

            let consumed = splitter::find_records(&buf[..filled], &mut ends);
            if consumed == 0 {
                tail = filled;
                continue;
            }

            let mut next = fresh_buffer(sink, buf.len());
            tail = filled - consumed;
            next[..tail].copy_from_slice(&buf[consumed..filled]);

            let data = mem::replace(&mut buf, next);
            let batch = Batch::new(data, mem::take(&mut ends), self.offset);
            self.offset += consumed as u64;
            stats.batches += 1;
            stats.records += batch.len() as u64;
            if !sink.submit(batch) {
                return Ok(stats);
            }
        }

        if tail > 0 {
            let batch = Batch::new(buf, vec![tail], self.offset);
            stats.batches += 1;
            stats.records += 1;
            sink.submit(batch);
        }
        Ok(stats)
    }

    fn grow(&self, buf: &mut Vec<u8>) -> Result<()> {
        if buf.len() >= self.max_buffer {
            return Err(BrcError::RecordTooLong {
                offset: self.offset,
                limit: self.max_buffer,
            });
        }
        let len = (buf.len() * 2).min(self.max_buffer);
        log::trace!("growing buffer at byte {} to {} bytes", self.offset, len);
        buf.resize(len, 0);
        Ok(())
    }
}

/// A recycled buffer keeps its old contents; only missing length is filled.
fn fresh_buffer<S: BatchSink>(sink: &mut S, len: usize) -> Vec<u8> {
    let mut buf = sink.reclaim().unwrap_or_default();
    if buf.len() < len {
        buf.resize(len, 0);
    }
    buf
}
