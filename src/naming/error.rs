//! Error types for the naming module.
//!
//! Template rendering degrades gracefully and never fails. The only hard
//! failures are a rendered path escaping its library root and I/O while
//! resolving that root.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building a library path.
#[derive(Debug, Error)]
pub enum NamingError {
    /// The rendered path resolves outside the library directory.
    #[error("path traversal detected: {candidate} would escape library directory {base}")]
    PathTraversal {
        /// Canonical library directory.
        base: PathBuf,
        /// Resolved path that fell outside it.
        candidate: PathBuf,
    },

    /// The library directory could not be resolved to an absolute path.
    #[error("IO error resolving {path}: {source}")]
    Io {
        /// The path being resolved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl NamingError {
    /// Creates a path traversal error.
    pub fn path_traversal(base: impl Into<PathBuf>, candidate: impl Into<PathBuf>) -> Self {
        Self::PathTraversal {
            base: base.into(),
            candidate: candidate.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
