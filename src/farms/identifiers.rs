//! Farm identifiers and their extraction from a downloaded layer file.

use crate::farms::error::FarmError;
use crate::layers::FeatureId;
use log::{error, info};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tokio::task;

/// Key of one farm record on the cabinet API.
///
/// GeoServer prefixes feature ids with the layer name (`<layer>.<id>`); the
/// API and the on-disk file names use the bare id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FarmId(String);

impl FarmId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Strips the `<layer_title>.` prefix from a GeoServer feature id. Ids
    /// without that prefix are kept as they are.
    ///
    /// ```
    /// use egistic::FarmId;
    ///
    /// let id = FarmId::from_feature_id("agrogis_farminfo_new.A", "agrogis_farminfo_new");
    /// assert_eq!(id.as_str(), "A");
    /// ```
    pub fn from_feature_id(raw: &str, layer_title: &str) -> Self {
        let stripped = raw
            .strip_prefix(layer_title)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(raw);
        Self(stripped.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stem of this farm's record file. Path separators are replaced so the
    /// file always lands directly inside the farms directory.
    pub fn file_stem(&self) -> String {
        self.0.replace(['/', '\\'], "_")
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.file_stem())
    }
}

impl fmt::Display for FarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
struct IdCollection {
    features: Vec<IdFeature>,
}

// Every other member, geometry included, is skipped while parsing
#[derive(Deserialize)]
struct IdFeature {
    #[serde(default)]
    id: Option<FeatureId>,
}

/// Farm identifiers found in one layer file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerIdentifiers {
    /// Identifiers in document order, duplicates kept.
    pub ids: Vec<FarmId>,
    /// Indices of features without a usable `id`.
    pub missing: Vec<usize>,
}

/// Extracts the farm identifier of every feature.
///
/// A feature without an id cannot be fetched; it is logged and recorded in
/// [`LayerIdentifiers::missing`] so the rest of the batch still runs. Only a
/// document that is not a feature collection is an error.
pub fn parse_farm_identifiers(
    bytes: &[u8],
    layer_title: &str,
) -> Result<LayerIdentifiers, serde_json::Error> {
    let collection: IdCollection = serde_json::from_slice(bytes)?;
    let mut identifiers = LayerIdentifiers::default();
    for (index, feature) in collection.features.into_iter().enumerate() {
        match feature.id {
            Some(id) => identifiers
                .ids
                .push(FarmId::from_feature_id(&id.to_string(), layer_title)),
            None => {
                error!("Feature #{} of layer {} has no id", index, layer_title);
                identifiers.missing.push(index);
            }
        }
    }
    Ok(identifiers)
}

/// Reads the layer file at `path` and extracts its farm identifiers.
pub async fn read_farm_identifiers(
    path: &Path,
    layer_title: &str,
) -> Result<LayerIdentifiers, FarmError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FarmError::LayerRead(path.to_path_buf(), e))?;

    let title = layer_title.to_string();
    let identifiers = task::spawn_blocking(move || parse_farm_identifiers(&bytes, &title))
        .await?
        .map_err(|e| FarmError::LayerDecode(path.to_path_buf(), e))?;

    info!(
        "Found {} farm identifiers in {:?} ({} features without id)",
        identifiers.ids.len(),
        path,
        identifiers.missing.len()
    );
    Ok(identifiers)
}
