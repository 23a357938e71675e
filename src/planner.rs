//! Splitting the input into independently readable byte ranges.

use std::fs::File;

use memmap2::Mmap;

use crate::error::Result;

/// Half-open span `[start, end)` of the input. Every boundary except file
/// start and EOF sits just past a newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Cuts `data` into at most `parts` ranges aligned to record boundaries.
///
/// Candidate cuts sit at `k * len / parts`; each one is pushed forward past
/// the next newline. Ranges that collapse to nothing (one record longer than
/// a whole share) are dropped, so fewer than `parts` ranges may come back.
/// Empty input yields no ranges.
pub fn plan(data: &[u8], parts: usize) -> Vec<ByteRange> {
    let len = data.len();
    if len == 0 {
        return Vec::new();
    }
    let parts = if len < parts { 1 } else { parts.max(1) };

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for k in 1..=parts {
        let end = if k == parts {
            len
        } else {
            let candidate = ((len as u64 * k as u64) / parts as u64) as usize;
            let from = candidate.max(start);
            match memchr::memchr(b'\n', &data[from..]) {
                Some(pos) => from + pos + 1,
                None => len,
            }
        };
        if end > start {
            ranges.push(ByteRange {
                start: start as u64,
                end: end as u64,
            });
            start = end;
        }
        if start == len {
            break;
        }
    }
    ranges
}

/// Plans ranges for an open file. Only the pages around each cut are
/// actually touched through the mapping.
pub fn plan_file(file: &File, parts: usize) -> Result<Vec<ByteRange>> {
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }
    // SAFETY: the mapping is read-only and dropped before returning. The
    // input is not expected to change while a run is in progress.
    let mmap = unsafe { Mmap::map(file)? };
    let ranges = plan(&mmap, parts);
    for range in &ranges {
        log::debug!("planned range {}..{} ({} bytes)", range.start, range.end, range.len());
    }
    Ok(ranges)
}
