use crate::aggregate::AggregateError;
use crate::farms::FarmError;
use crate::layers::LayerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EgisticError {
    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error(transparent)]
    Farm(#[from] FarmError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}
