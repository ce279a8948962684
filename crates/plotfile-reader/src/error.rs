//! Error types for plotfile reading.

use std::path::PathBuf;

use thiserror::Error;

use crate::status::Severity;
use crate::types::GridBox;

/// Errors that can occur while loading a plotfile or extracting a subdomain.
///
/// Every variant aborts the operation that produced it and maps to
/// [`Severity::Fatal`]. A request that only partially overlaps the dataset
/// is not an error; it is reported through
/// [`ExtractReport::severity`](crate::ExtractReport::severity).
#[derive(Error, Debug)]
pub enum PlotfileError {
    /// A header file could not be read.
    #[error("Failed to read {path}: {source}")]
    HeaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A header file was readable but malformed.
    #[error("invalid header {path}: {reason}")]
    InvalidHeader { path: PathBuf, reason: String },

    /// The plotfile uses a layout this reader does not handle.
    #[error("unsupported plotfile layout: {0}")]
    UnsupportedLayout(String),

    /// The box list and the FabOnDisk list disagree in length.
    #[error("Unexpected data format: {boxes} boxes but {fabs} FABs on disk")]
    CountMismatch { boxes: usize, fabs: usize },

    /// The level index lists no grids.
    #[error("grid catalog is empty")]
    EmptyCatalog,

    /// Extraction was requested before a dataset was loaded.
    #[error("plotfile header not loaded yet")]
    NotLoaded,

    /// A data file could not be opened.
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The record at the catalog offset does not start with `FAB`.
    #[error("Wrong data format: no FAB magic at {path}:{offset}")]
    BadMagic { path: PathBuf, offset: u64 },

    /// The box stored in the record differs from the catalog box.
    #[error("Wrong data format: {path}:{offset} holds box {found}, catalog expects {expected}")]
    BoxMismatch {
        path: PathBuf,
        offset: u64,
        expected: GridBox,
        found: GridBox,
    },

    /// The record holds a component count other than 3.
    #[error("Wrong data format: {path}:{offset} has {found} components, not 3")]
    ComponentMismatch {
        path: PathBuf,
        offset: u64,
        found: usize,
    },

    /// The record header could not be decoded.
    #[error("Wrong data format: malformed FAB header at {path}:{offset}: {reason}")]
    MalformedRecord {
        path: PathBuf,
        offset: u64,
        reason: String,
    },

    /// The payload ended before `ncomp * ncells` values were read.
    #[error("truncated FAB at {path}:{offset}: expected {expected_bytes} payload bytes")]
    TruncatedRecord {
        path: PathBuf,
        offset: u64,
        expected_bytes: u64,
    },

    /// The caller's output buffer cannot hold the query.
    #[error("output buffer holds {actual} values, query needs {required}")]
    OutputTooSmall { required: usize, actual: usize },

    /// The query cannot be represented (cell count overflow).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Any other I/O failure while reading a data file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PlotfileError {
    /// Create an InvalidHeader error.
    pub fn invalid_header(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedLayout error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedLayout(msg.into())
    }

    /// Create a MalformedRecord error.
    pub fn malformed_record(path: impl Into<PathBuf>, offset: u64, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            offset,
            reason: reason.into(),
        }
    }

    /// Severity class of this error.
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

/// Result type for plotfile operations.
pub type Result<T> = std::result::Result<T, PlotfileError>;
