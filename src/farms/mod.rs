pub mod error;
pub mod fetcher;
pub mod identifiers;

pub use error::FarmError;
pub use fetcher::{FarmFetchReport, FarmFetcher};
pub use identifiers::{parse_farm_identifiers, read_farm_identifiers, FarmId, LayerIdentifiers};
