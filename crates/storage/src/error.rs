use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger file exists but could not be read or parsed.
    ///
    /// Never surfaced by public ledger operations; they recover by treating
    /// the ledger as empty.
    #[error("trust ledger at {path} is corrupt: {reason}")]
    LedgerCorrupt { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
