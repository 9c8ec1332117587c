pub mod collection;
pub mod descriptor;
pub mod error;
pub mod fetcher;

pub use collection::{Feature, FeatureCollection, FeatureId};
pub use descriptor::{LayerDescriptor, DEFAULT_LAYERS, FARM_INFO_LAYER};
pub use error::LayerError;
pub use fetcher::LayerFetcher;
