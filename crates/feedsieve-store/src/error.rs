use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading or writing the store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file {path} is not a JSON object")]
    NotAnObject { path: PathBuf },

    #[error("Failed to parse store file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored value under '{key}' is malformed: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
