//! Loader error types.

use std::path::{Path, PathBuf};

/// Errors raised while finding or reading lock files and manifests.
#[derive(Debug, thiserror::Error)]
pub enum LockfileError {
    /// A path given on the command line or implied by it does not exist.
    #[error("not found path: {path}")]
    NotFound { path: PathBuf },

    /// None of the known lock file names exist in a directory.
    #[error("no lock file found in {dir} (looked for {})", crate::discover::LOCKFILE_NAMES.join(", "))]
    NoLockfile { dir: PathBuf },

    /// A lock file format or version this crate does not read.
    #[error("unsupported lock file {path}: {detail}")]
    Unsupported { path: PathBuf, detail: String },

    /// Malformed content.
    #[error("parse error in {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    /// I/O error.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON error.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// YAML error.
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl LockfileError {
    pub(crate) fn parse(path: &Path, detail: impl Into<String>) -> Self {
        LockfileError::Parse {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }

    /// The file or directory the error is about.
    pub fn path(&self) -> &Path {
        match self {
            LockfileError::NotFound { path }
            | LockfileError::Unsupported { path, .. }
            | LockfileError::Parse { path, .. }
            | LockfileError::Io { path, .. }
            | LockfileError::Json { path, .. }
            | LockfileError::Yaml { path, .. } => path,
            LockfileError::NoLockfile { dir } => dir,
        }
    }
}

/// Read a whole file, attaching the path to any error.
pub(crate) fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LockfileError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LockfileError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, LockfileError>;
