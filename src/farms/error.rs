use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FarmError {
    #[error("Failed to read layer file '{0}'")]
    LayerRead(PathBuf, #[source] std::io::Error),

    #[error("Layer file '{0}' is not a JSON feature collection")]
    LayerDecode(PathBuf, #[source] serde_json::Error),

    #[error("Failed to create farms directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Cannot build a request URL for farm {0}")]
    InvalidUrl(String),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Response from {url} is not valid JSON")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to encode farm record for '{0}'")]
    Encode(PathBuf, #[source] serde_json::Error),

    #[error("Failed to write farm file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl FarmError {
    /// HTTP status of a rejected request, if that is what failed.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            FarmError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
