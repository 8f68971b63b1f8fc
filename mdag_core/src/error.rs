//! Error types for mdag_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using mdag_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or resolving a DAG.
#[derive(Error, Debug)]
pub enum Error {
    /// Nothing is stored under the given hash.
    #[error("Object not found: {hash}")]
    ObjectNotFound { hash: String },

    /// A path segment did not match any link of the current object.
    #[error("Path not found: no entry named {segment:?} in {path:?}")]
    PathNotFound { path: String, segment: String },

    /// Resolution ended on a directory, which has no byte representation.
    #[error("Is a directory: {path:?}")]
    IsDirectory { path: String },

    /// I/O failure in the underlying store.
    #[error("Store error: {source}")]
    Store {
        #[from]
        source: std::io::Error,
    },

    /// Writing reconstructed bytes to the caller's writer failed.
    #[error("Output error: {source}")]
    Output {
        #[source]
        source: std::io::Error,
    },

    /// Stored bytes are not a valid object.
    #[error("Encoding error: {reason}")]
    Encoding { reason: String },

    /// Invalid hash format or encoding.
    #[error("Invalid hash: {reason}")]
    InvalidHash { reason: String },

    /// Invalid link (bad name for its object type).
    #[error("Invalid link: {reason}")]
    InvalidLink { reason: String },

    /// Invalid store configuration or chunker setting.
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// Store is invalid or not initialized.
    #[error("Invalid store at {path}: {reason}")]
    InvalidStore { path: PathBuf, reason: String },

    /// Unsupported hash algorithm.
    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// The filesystem walker hit something that is neither file nor directory.
    #[error("Unsupported file type: {path}")]
    UnsupportedFileType { path: PathBuf },
}

/// Coarse classification of an [`Error`].
///
/// Lets callers tell "nothing at this hash" apart from "no such entry" and
/// "this is a directory" without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PathNotFound,
    IsDirectory,
    Store,
    Output,
    Encoding,
    Invalid,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ObjectNotFound { .. } => ErrorKind::NotFound,
            Error::PathNotFound { .. } => ErrorKind::PathNotFound,
            Error::IsDirectory { .. } => ErrorKind::IsDirectory,
            Error::Store { .. } => ErrorKind::Store,
            Error::Output { .. } => ErrorKind::Output,
            Error::Encoding { .. } => ErrorKind::Encoding,
            Error::InvalidHash { .. }
            | Error::InvalidLink { .. }
            | Error::InvalidConfig { .. }
            | Error::InvalidStore { .. }
            | Error::UnsupportedAlgorithm { .. }
            | Error::UnsupportedFileType { .. } => ErrorKind::Invalid,
        }
    }

    /// Create an ObjectNotFound error.
    pub fn object_not_found(hash: impl Into<String>) -> Self {
        Error::ObjectNotFound { hash: hash.into() }
    }

    /// Create a PathNotFound error.
    pub fn path_not_found(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Error::PathNotFound {
            path: path.into(),
            segment: segment.into(),
        }
    }

    /// Create an IsDirectory error.
    pub fn is_directory(path: impl Into<String>) -> Self {
        Error::IsDirectory { path: path.into() }
    }

    /// Create an Output error from a failed write to the destination.
    pub fn output(source: std::io::Error) -> Self {
        Error::Output { source }
    }

    /// Create an Encoding error.
    pub fn encoding(reason: impl Into<String>) -> Self {
        Error::Encoding {
            reason: reason.into(),
        }
    }

    /// Create an InvalidHash error.
    pub fn invalid_hash(reason: impl Into<String>) -> Self {
        Error::InvalidHash {
            reason: reason.into(),
        }
    }

    /// Create an InvalidLink error.
    pub fn invalid_link(reason: impl Into<String>) -> Self {
        Error::InvalidLink {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an InvalidStore error.
    pub fn invalid_store(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedAlgorithm error.
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }

    /// Create an UnsupportedFileType error.
    pub fn unsupported_file_type(path: impl Into<PathBuf>) -> Self {
        Error::UnsupportedFileType { path: path.into() }
    }
}

// Additional From implementations for external error types

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Store { source: err.error }
    }
}

impl From<ignore::Error> for Error {
    fn from(err: ignore::Error) -> Self {
        // ignore::Error can wrap an io::Error or be a path error
        match err.io_error() {
            Some(io_err) => Error::Store {
                source: std::io::Error::new(io_err.kind(), io_err.to_string()),
            },
            None => Error::Store {
                source: std::io::Error::other(err.to_string()),
            },
        }
    }
}
