use crate::config::Config;
use crate::layers::descriptor::LayerDescriptor;
use crate::layers::error::LayerError;
use crate::layout::DataLayout;
use crate::urls::Subdomain;
use crate::utils::{ensure_dir_exists, progress_bar, temp_dir_for};
use futures_util::TryStreamExt;
use indicatif::ProgressBar;
use log::{info, warn};
use reqwest::Client;
use std::io;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

/// Downloads layer snapshots from GeoServer one at a time.
pub struct LayerFetcher<'a> {
    http: &'a Client,
    config: &'a Config,
    layout: DataLayout,
    progress: ProgressBar,
}

impl<'a> LayerFetcher<'a> {
    pub fn new(http: &'a Client, config: &'a Config) -> Self {
        Self {
            http,
            config,
            layout: DataLayout::new(config.base_dir()),
            progress: progress_bar(config.show_progress()),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Fetches every layer in order and returns the files written.
    ///
    /// A layer that fails is logged and skipped; the remaining layers are still
    /// attempted. Only a missing, uncreatable layers directory aborts the stage.
    pub async fn fetch_all(&self, layers: &[LayerDescriptor]) -> Result<Vec<PathBuf>, LayerError> {
        let directory = self.layout.layers_dir();
        ensure_dir_exists(&directory)
            .await
            .map_err(|e| LayerError::DirCreation(directory.clone(), e))?;

        self.progress.set_length(layers.len() as u64);
        let mut written = Vec::with_capacity(layers.len());
        for layer in layers {
            self.progress.set_message(layer.title);
            match self.fetch(layer).await {
                Ok(path) => written.push(path),
                Err(e) => warn!("Skipping layer {}: {}", layer.title, e),
            }
            self.progress.inc(1);
        }
        self.progress.finish_with_message("layers done");
        info!("Fetched {}/{} layers", written.len(), layers.len());
        Ok(written)
    }

    /// Streams one layer to `<title>.json`, replacing any previous snapshot.
    ///
    /// The body goes to a temp file first, so a broken transfer leaves the
    /// previous snapshot (or nothing) in place.
    pub async fn fetch(&self, layer: &LayerDescriptor) -> Result<PathBuf, LayerError> {
        let url = self.config.url(Subdomain::Geo, &layer.query_path());
        let path = self.layout.layer_file(layer.title);
        info!("Downloading layer {} from {}", layer.title, url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| LayerError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    LayerError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    LayerError::NetworkRequest(url, e)
                });
            }
        };

        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);

        let temp_file = NamedTempFile::new_in(temp_dir_for(&path))
            .map_err(|e| LayerError::Write(path.clone(), e))?;
        let (std_file, temp_path) = temp_file.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        let copied = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| LayerError::Stream {
                url: url.clone(),
                path: path.clone(),
                source: e,
            })?;
        file.flush()
            .await
            .map_err(|e| LayerError::Write(path.clone(), e))?;
        drop(file);

        temp_path
            .persist(&path)
            .map_err(|e| LayerError::Write(path.clone(), e.error))?;
        info!("Saved layer {} ({} bytes) to {:?}", layer.title, copied, path);
        Ok(path)
    }
}
