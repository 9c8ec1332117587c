//! Joins the fetched farm records onto the layer features that reference them.
//!
//! Only farms with a non-empty `occupation` or `cultures` take part. A farm is
//! matched to a feature when the farm file stem equals the file stem the farm
//! fetcher would give the feature id, `<layer title>.` prefix stripped. For every layer with at least one match,
//! an `aggregated/<title>.json` feature collection is written holding just the
//! matched features, each carrying the farm record under `properties.farm`.

pub mod error;

use crate::farms::FarmId;
use crate::layers::FeatureCollection;
use crate::layout::DataLayout;
use crate::utils::{persist_bytes, to_pretty_json};
pub use error::AggregateError;
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::task;

/// Key under which the farm record is merged into feature properties.
pub const FARM_PROPERTY: &str = "farm";

/// One aggregated layer file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedLayer {
    pub title: String,
    pub matched: usize,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub farms_scanned: usize,
    pub farms_selected: usize,
    pub outputs: Vec<AggregatedLayer>,
}

/// Truthiness of a JSON value: null, `false`, `0`, and empty strings, arrays
/// and objects count as empty.
fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
    }
}

/// Whether a farm record carries anything worth aggregating.
pub fn is_relevant(record: &Value) -> bool {
    is_filled(record.get("occupation")) || is_filled(record.get("cultures"))
}

/// Keeps the features of `collection` that match a farm, merging the record
/// into each. `farms` is keyed by farm file stem (see [`FarmId::file_stem`]).
/// Returns `None` when nothing matched.
pub fn join_layer(
    collection: &FeatureCollection,
    title: &str,
    farms: &HashMap<String, Value>,
) -> Option<FeatureCollection> {
    let mut joined = FeatureCollection::empty_like(collection);
    for feature in &collection.features {
        let Some(id) = &feature.id else {
            continue;
        };
        let key = FarmId::from_feature_id(&id.to_string(), title).file_stem();
        let Some(record) = farms.get(&key) else {
            continue;
        };
        let mut feature = feature.clone();
        feature
            .properties
            .get_or_insert_with(Map::new)
            .insert(FARM_PROPERTY.to_string(), record.clone());
        joined.features.push(feature);
    }
    (!joined.features.is_empty()).then_some(joined)
}

pub struct Aggregator {
    layout: DataLayout,
}

impl Aggregator {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// Runs the join over every farm and layer file on disk.
    pub async fn run(&self) -> Result<AggregateReport, AggregateError> {
        let layout = self.layout.clone();
        let report = task::spawn_blocking(move || aggregate(&layout)).await??;
        info!(
            "Aggregated {} of {} farms into {} layer files",
            report.farms_selected,
            report.farms_scanned,
            report.outputs.len()
        );
        Ok(report)
    }
}

fn json_files(directory: &Path) -> Result<Vec<PathBuf>, AggregateError> {
    let entries = std::fs::read_dir(directory)
        .map_err(|e| AggregateError::DirRead(directory.to_path_buf(), e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| AggregateError::DirRead(directory.to_path_buf(), e))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn aggregate(layout: &DataLayout) -> Result<AggregateReport, AggregateError> {
    let mut report = AggregateReport::default();

    let mut farms = HashMap::new();
    for path in json_files(&layout.farms_dir())? {
        report.farms_scanned += 1;
        let bytes =
            std::fs::read(&path).map_err(|e| AggregateError::FileRead(path.clone(), e))?;
        let record: Value = serde_json::from_slice(&bytes)
            .map_err(|e| AggregateError::FarmDecode(path.clone(), e))?;
        if is_relevant(&record) {
            farms.insert(file_stem(&path), record);
        } else {
            debug!("Farm {:?} has no occupation or cultures, skipping", path);
        }
    }
    report.farms_selected = farms.len();
    if farms.is_empty() {
        return Ok(report);
    }

    let output_dir = layout.aggregated_dir();
    std::fs::create_dir_all(&output_dir)
        .map_err(|e| AggregateError::DirCreation(output_dir.clone(), e))?;

    for path in json_files(&layout.layers_dir())? {
        let title = file_stem(&path);
        let bytes =
            std::fs::read(&path).map_err(|e| AggregateError::FileRead(path.clone(), e))?;
        let collection: FeatureCollection = serde_json::from_slice(&bytes)
            .map_err(|e| AggregateError::LayerDecode(path.clone(), e))?;

        let Some(joined) = join_layer(&collection, &title, &farms) else {
            debug!("Layer {} references none of the selected farms", title);
            continue;
        };

        let output = layout.aggregated_file(&title);
        let contents =
            to_pretty_json(&joined).map_err(|e| AggregateError::Encode(output.clone(), e))?;
        persist_bytes(&output, &contents).map_err(|e| AggregateError::Write(output.clone(), e))?;
        info!(
            "Joined {} farms onto layer {} at {:?}",
            joined.features.len(),
            title,
            output
        );
        report.outputs.push(AggregatedLayer {
            title,
            matched: joined.features.len(),
            path: output,
        });
    }
    Ok(report)
}
