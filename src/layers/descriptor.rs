/// Title of the layer whose feature ids key the farm records.
pub const FARM_INFO_LAYER: &str = "agrogis_farminfo_new";

/// A named GeoServer layer together with its spatial filter.
///
/// The filter is an opaque, pre-encoded query fragment (bbox and image size)
/// appended verbatim to the GetMap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerDescriptor {
    pub title: &'static str,
    pub filter: &'static str,
}

impl LayerDescriptor {
    pub const fn new(title: &'static str, filter: &'static str) -> Self {
        Self { title, filter }
    }

    /// GetMap query path for this layer on the `geo` front-end.
    pub fn query_path(&self) -> String {
        format!(
            "geoserver/main/wms?service=WMS&version=1.1.0&request=GetMap&layers=main%3A{}{}&srs=EPSG%3A3857&styles=&format=geojson",
            self.title, self.filter
        )
    }
}

/// Layers downloaded on every run.
pub const DEFAULT_LAYERS: [LayerDescriptor; 5] = [
    LayerDescriptor::new(
        "15",
        "&bbox=7647267.869542876%2C6764043.948365914%2C7697978.538731981%2C6814664.154490127&width=768&height=766",
    ),
    LayerDescriptor::new(
        "agrogis_farminfo",
        "&bbox=5177527.5%2C4948971.0%2C9712419.0%2C7447898.5&width=768&height=423",
    ),
    LayerDescriptor::new(
        FARM_INFO_LAYER,
        "&bbox=5177527.5%2C4948989.0%2C9712323.0%2C7447898.5&width=768&height=423",
    ),
    LayerDescriptor::new(
        "cadastres_bingeometry",
        "&bbox=5180213.5%2C4966549.0%2C9650294.0%2C7447880.5&width=768&height=426",
    ),
    LayerDescriptor::new(
        "cadastres_farmgisinfo",
        "&bbox=5180213.5%2C4966549.0%2C9650294.0%2C7447880.5&width=768&height=426",
    ),
];
