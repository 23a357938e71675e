//! Rendering of the merged result as `{name=min/mean/max, ...}`.

use std::io::{self, Write};
use std::path::Path;

use rayon::prelude::*;
use tempfile::NamedTempFile;

use crate::aggregate::{Aggregator, Stat};
use crate::error::Result;

/// Merged statistics sorted by the raw bytes of each name.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    entries: Vec<(Box<[u8]>, Stat)>,
}

impl From<Aggregator> for Summary {
    fn from(agg: Aggregator) -> Self {
        let mut entries = agg.into_entries();
        entries.par_sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }
}

impl Summary {
    pub fn entries(&self) -> &[(Box<[u8]>, Stat)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry, including the last, is followed by `, `. No newline is
    /// written after the closing brace.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(b"{")?;
        for (name, stat) in &self.entries {
            out.write_all(name)?;
            out.write_all(b"=")?;
            write_tenths(out, stat.min as i64)?;
            out.write_all(b"/")?;
            write_tenths(out, stat.mean_tenths())?;
            out.write_all(b"/")?;
            write_tenths(out, stat.max as i64)?;
            out.write_all(b", ")?;
        }
        out.write_all(b"}")
    }

    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * 32 + 2);
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut out);
        out
    }

    /// Writes to a temporary file next to `path` and renames it into place,
    /// so `path` never holds a partial result.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut out = io::BufWriter::new(tmp.as_file_mut());
            self.write_to(&mut out)?;
            out.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Writes whole tenths with one decimal digit. Zero is always `0.0`.
fn write_tenths<W: Write>(out: &mut W, tenths: i64) -> io::Result<()> {
    if tenths < 0 {
        out.write_all(b"-")?;
    }
    let abs = tenths.unsigned_abs();
    let mut digits = [0u8; 20];
    out.write_all(lexical_core::write(abs / 10, &mut digits))?;
    out.write_all(&[b'.', b'0' + (abs % 10) as u8])
}

/// Convenience for callers that only need the rendered bytes.
pub fn render(agg: Aggregator) -> Vec<u8> {
    Summary::from(agg).render()
}
