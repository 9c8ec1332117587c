mod aggregate;
mod auth;
mod config;
mod egistic;
mod error;
mod farms;
mod layers;
mod layout;
mod urls;
mod utils;

pub use egistic::*;
pub use error::EgisticError;

pub use auth::{sign_in, AccessToken};
pub use config::{Config, Credentials, DEFAULT_CONCURRENCY};
pub use layout::DataLayout;
pub use urls::{build_url, Subdomain, EGISTIC_DOMAIN};

pub use layers::{
    Feature, FeatureCollection, FeatureId, LayerDescriptor, LayerError, LayerFetcher,
    DEFAULT_LAYERS, FARM_INFO_LAYER,
};

pub use farms::{
    parse_farm_identifiers, read_farm_identifiers, FarmError, FarmFetchReport, FarmFetcher,
    FarmId, LayerIdentifiers,
};

pub use aggregate::{
    is_relevant, join_layer, AggregateError, AggregateReport, AggregatedLayer, Aggregator,
    FARM_PROPERTY,
};
