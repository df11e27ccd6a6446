use std::path::PathBuf;
use thiserror::Error;

/// Bundle loading errors
///
/// Every variant is terminal for the load call that produced it: no partial
/// bundle is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed input: {0}")]
    MalformedInput(#[source] serde_json::Error),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl BundleError {
    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        BundleError::SchemaMismatch(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BundleError>;
