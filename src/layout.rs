//! On-disk layout of the downloaded and derived artifacts.

use crate::farms::FarmId;
use std::path::{Path, PathBuf};

const LAYERS_SUBDIR: &str = "data/parsing/egistic/layers";
const FARMS_SUBDIR: &str = "data/parsing/egistic/farms";
const AGGREGATED_SUBDIR: &str = "data/parsing/egistic/aggregated";

/// Resolves artifact paths relative to a base data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layers_dir(&self) -> PathBuf {
        self.root.join(LAYERS_SUBDIR)
    }

    pub fn farms_dir(&self) -> PathBuf {
        self.root.join(FARMS_SUBDIR)
    }

    pub fn aggregated_dir(&self) -> PathBuf {
        self.root.join(AGGREGATED_SUBDIR)
    }

    pub fn layer_file(&self, title: &str) -> PathBuf {
        self.layers_dir().join(format!("{}.json", title))
    }

    pub fn farm_file(&self, id: &FarmId) -> PathBuf {
        self.farms_dir().join(id.file_name())
    }

    pub fn aggregated_file(&self, title: &str) -> PathBuf {
        self.aggregated_dir().join(format!("{}.json", title))
    }
}
