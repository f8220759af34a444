/// Error types shared by the catalog, the config loader and the importer
///
/// Catalog errors travel inside UI messages, so they carry rendered
/// strings instead of the underlying `rusqlite` / `serde_json` errors
/// (which are not `Clone`).

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a Catalog Store operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    /// The store could not be reached or the query failed
    #[error("catalog store unavailable: {0}")]
    Transport(String),

    /// A stored record could not be decoded
    #[error("malformed record #{id}: {reason}")]
    Malformed { id: i64, reason: String },
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Transport(err.to_string())
    }
}

/// Failure while loading `config.json`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of a single file during a folder import
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid record file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid record in {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
