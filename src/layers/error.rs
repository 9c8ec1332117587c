use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayerError {
    #[error("Failed to create layers directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    // Covers both a broken response stream and a failing disk write mid-copy
    #[error("Failed to stream {url} to '{path}'")]
    Stream {
        url: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write layer file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),
}
