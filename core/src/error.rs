use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure while reading a persisted artifact.
///
/// Loads are all-or-nothing: a single bad line fails the whole file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: {reason}", path.display())]
    Malformed { path: PathBuf, line: usize, reason: String },
    #[error("{}:{line}: stored count {stored} for `{word}` does not match {actual} listed documents", path.display())]
    CountMismatch { path: PathBuf, line: usize, word: String, stored: usize, actual: usize },
    #[error("no `{prefix}*` vectors in {}", dir.display())]
    MissingVectors { dir: PathBuf, prefix: &'static str },
    #[error("`{prefix}*` vectors in {} do not cover the indexed documents; missing: {}", dir.display(), missing.join(", "))]
    VectorSetMismatch { dir: PathBuf, prefix: &'static str, missing: Vec<String> },
}

impl LoadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        LoadError::Io { path: path.to_path_buf(), source }
    }

    pub(crate) fn malformed(path: &Path, line: usize, reason: impl Into<String>) -> Self {
        LoadError::Malformed { path: path.to_path_buf(), line, reason: reason.into() }
    }
}
