use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while computing the ETag of a file.
#[derive(Debug, Error)]
pub enum Error {
    #[error("open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// The step that failed, as it prefixes the message: `open` or `read`.
    pub fn operation(&self) -> &'static str {
        match self {
            Error::Open { .. } => "open",
            Error::Read { .. } => "read",
        }
    }

    /// The file the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Error::Open { path, .. } | Error::Read { path, .. } => path,
        }
    }
}

/// Rejected chunk size text or value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChunkSizeError {
    #[error("invalid chunk size {0:?}: expected a decimal number with an optional KB, MB, GB or TB suffix")]
    Invalid(String),

    #[error("chunk size {0:?} out of range")]
    OutOfRange(String),

    #[error("non-positive chunk size")]
    NonPositive,
}
