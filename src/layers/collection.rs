//! Minimal GeoJSON model for the layer files.
//!
//! Only `id` and `properties` are interpreted; geometry and any other members
//! are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A feature identifier. GeoServer emits strings such as
/// `agrogis_farminfo_new.123`, but GeoJSON also allows numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Text(text) => f.write_str(text),
            FeatureId::Number(number) => write!(f, "{}", number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,
    pub features: Vec<Feature>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

impl FeatureCollection {
    /// An empty collection that keeps the top-level members (such as `crs`) of
    /// `template`.
    pub fn empty_like(template: &FeatureCollection) -> Self {
        Self {
            kind: template.kind.clone(),
            features: Vec::new(),
            other: template.other.clone(),
        }
    }
}
