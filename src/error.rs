//! Error types for onebrc.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::record::RecordErrorKind;

/// Longest line excerpt carried in a [`Error::Malformed`].
const MAX_EXCERPT_BYTES: usize = 120;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open input file {}", path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read input")]
    ReadInput {
        #[source]
        source: io::Error,
    },

    #[error("failed to write output file {}", path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {kind}: {content:?}")]
    Malformed {
        line: usize,
        offset: usize,
        kind: RecordErrorKind,
        content: String,
    },

    #[error("failed to build worker pool")]
    WorkerPool {
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

impl Error {
    /// Builds a [`Error::Malformed`] from the offending line bytes.
    pub fn malformed(line: usize, offset: usize, kind: RecordErrorKind, bytes: &[u8]) -> Self {
        let excerpt = &bytes[..bytes.len().min(MAX_EXCERPT_BYTES)];
        Error::Malformed {
            line,
            offset,
            kind,
            content: String::from_utf8_lossy(excerpt).into_owned(),
        }
    }
}
