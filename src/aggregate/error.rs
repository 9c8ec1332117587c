use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Failed to list directory '{0}'")]
    DirRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to create aggregated directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read '{0}'")]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Farm file '{0}' is not valid JSON")]
    FarmDecode(PathBuf, #[source] serde_json::Error),

    #[error("Layer file '{0}' is not a GeoJSON feature collection")]
    LayerDecode(PathBuf, #[source] serde_json::Error),

    #[error("Failed to encode aggregated layer '{0}'")]
    Encode(PathBuf, #[source] serde_json::Error),

    #[error("Failed to write aggregated layer '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
