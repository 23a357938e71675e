use std::io;
use std::path::PathBuf;

/// Everything that can abort an aggregation run.
#[derive(Debug, thiserror::Error)]
pub enum BrcError {
    #[error("input not found: {}: {source}", .path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed record at byte {offset}: no ';' separator")]
    MalformedRecord { offset: u64 },

    #[error("malformed value {token:?} at byte {offset}")]
    MalformedValue { offset: u64, token: String },

    #[error("record at byte {offset} does not fit in {limit} bytes")]
    RecordTooLong { offset: u64, limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, BrcError>;
