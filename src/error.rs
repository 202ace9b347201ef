// src/error.rs

//! Error types for the snapshot builder
//!
//! Fatal conditions abort a version's build before anything is published.
//! Recoverable conditions (unresolved dependencies, unknown tracker
//! references, malformed tracker fields) are logged and counted instead of
//! being surfaced here.

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Failed to fetch or parse the index for one (repository, architecture)
    #[error("Failed to load index for {repo}/{arch}: {reason}")]
    IndexFetchError {
        repo: String,
        arch: String,
        reason: String,
    },

    /// A sub-package names an origin that was never seen as a main package
    #[error("Package '{package}' references unknown origin '{origin}'")]
    DanglingOriginError { package: String, origin: String },

    /// Failed to talk to an issue tracker or change-request service
    #[error("{service} request failed: {reason}")]
    ExternalFetchError { service: String, reason: String },

    /// Unrecognized version comparison operator
    #[error("Invalid version operator: {0:?}")]
    InvalidOperator(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    #[error("Download error: {0}")]
    DownloadError(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl Error {
    /// Wrap any failure while loading an index into an `IndexFetchError`
    pub fn index_fetch(repo: &str, arch: &str, reason: impl ToString) -> Self {
        Error::IndexFetchError {
            repo: repo.to_string(),
            arch: arch.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Wrap any failure while querying an external service
    pub fn external(service: &str, reason: impl ToString) -> Self {
        Error::ExternalFetchError {
            service: service.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for errors raised because an index could not be loaded
    pub fn is_index_fetch(&self) -> bool {
        matches!(self, Error::IndexFetchError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_fetch_names_repo_and_arch() {
        let err = Error::index_fetch("main", "x86_64", "HTTP 404");
        assert!(err.is_index_fetch());
        assert_eq!(
            err.to_string(),
            "Failed to load index for main/x86_64: HTTP 404"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::IoError(_)));
    }

    #[test]
    fn test_dangling_origin_message() {
        let err = Error::DanglingOriginError {
            package: "foo-doc".to_string(),
            origin: "foo".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Package 'foo-doc' references unknown origin 'foo'"
        );
    }
}
