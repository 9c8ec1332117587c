//! This module provides the main entry point for the Egistic pipeline.
//! It owns the configuration and the HTTP client and runs the three stages:
//! layer download, farm metadata download and aggregation.

use crate::aggregate::{AggregateReport, Aggregator};
use crate::auth::{sign_in, AccessToken};
use crate::config::Config;
use crate::error::EgisticError;
use crate::farms::{read_farm_identifiers, FarmFetchReport, FarmFetcher, FarmId};
use crate::layers::{LayerDescriptor, LayerFetcher, DEFAULT_LAYERS, FARM_INFO_LAYER};
use crate::layout::DataLayout;
use log::info;
use reqwest::Client;
use std::path::PathBuf;

/// What one full pipeline run produced.
#[derive(Debug)]
pub struct PipelineSummary {
    pub layers: Vec<PathBuf>,
    pub farms: FarmFetchReport,
    pub aggregate: AggregateReport,
}

/// The pipeline client.
///
/// One `reqwest::Client` is created per instance and shared, read-only, by
/// every stage and every concurrent request.
///
/// # Examples
///
/// ```no_run
/// # use egistic::{Config, Credentials, Egistic, EgisticError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), EgisticError> {
/// let config = Config::builder()
///     .credentials(Credentials::new("user", "password"))
///     .base_dir("/var/lib/egistic")
///     .build();
/// let egistic = Egistic::new(config)?;
///
/// let summary = egistic.run().await?;
/// println!("{} farm records written", summary.farms.written.len());
/// # Ok(())
/// # }
/// ```
pub struct Egistic {
    config: Config,
    http: Client,
    layout: DataLayout,
}

impl Egistic {
    /// Creates a pipeline with its own HTTP client. No request timeout is set.
    ///
    /// # Errors
    ///
    /// Returns [`EgisticError::HttpClient`] if the TLS backend cannot be initialised.
    pub fn new(config: Config) -> Result<Self, EgisticError> {
        let http = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs())
            .build()
            .map_err(EgisticError::HttpClient)?;
        Ok(Self::with_client(config, http))
    }

    /// Creates a pipeline around an existing HTTP client.
    pub fn with_client(config: Config, http: Client) -> Self {
        let layout = DataLayout::new(config.base_dir());
        Self {
            config,
            http,
            layout,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Exchanges the configured credentials for a token; `None` on any failure.
    pub async fn sign_in(&self) -> Option<AccessToken> {
        sign_in(&self.http, &self.config).await
    }

    /// Downloads [`DEFAULT_LAYERS`].
    pub async fn fetch_layers(&self) -> Result<Vec<PathBuf>, EgisticError> {
        self.fetch_layers_from(&DEFAULT_LAYERS).await
    }

    /// Downloads the given layers sequentially, skipping the ones that fail.
    pub async fn fetch_layers_from(
        &self,
        layers: &[LayerDescriptor],
    ) -> Result<Vec<PathBuf>, EgisticError> {
        Ok(LayerFetcher::new(&self.http, &self.config)
            .fetch_all(layers)
            .await?)
    }

    /// Signs in, reads the farm identifiers from the farm-info layer file and
    /// downloads one record per identifier.
    ///
    /// # Errors
    ///
    /// Fails before any farm request is made if the layer file is missing or
    /// is not a feature collection, or if the farms directory cannot be
    /// created. Individual farm failures, features without an id included,
    /// are reported in the returned [`FarmFetchReport`] instead.
    pub async fn fetch_farms_metadata(&self) -> Result<FarmFetchReport, EgisticError> {
        let token = self.sign_in().await;
        let identifiers =
            read_farm_identifiers(&self.layout.layer_file(FARM_INFO_LAYER), FARM_INFO_LAYER)
                .await?;
        let mut report = self.fetch_farms(identifiers.ids, token.as_ref()).await?;
        report.unidentified = identifiers.missing;
        Ok(report)
    }

    /// Downloads one record per identifier with the configured concurrency.
    pub async fn fetch_farms(
        &self,
        identifiers: Vec<FarmId>,
        token: Option<&AccessToken>,
    ) -> Result<FarmFetchReport, EgisticError> {
        Ok(FarmFetcher::new(&self.http, &self.config, token)
            .fetch_all(identifiers)
            .await?)
    }

    /// Joins the downloaded farm records onto the downloaded layers.
    pub async fn aggregate(&self) -> Result<AggregateReport, EgisticError> {
        Ok(Aggregator::new(self.layout.clone()).run().await?)
    }

    /// Runs all three stages in order. Each stage reads what the previous one
    /// wrote to disk.
    pub async fn run(&self) -> Result<PipelineSummary, EgisticError> {
        info!("Data directory: {}", self.layout.root().display());
        let layers = self.fetch_layers().await?;
        let farms = self.fetch_farms_metadata().await?;
        let aggregate = self.aggregate().await?;
        Ok(PipelineSummary {
            layers,
            farms,
            aggregate,
        })
    }
}
