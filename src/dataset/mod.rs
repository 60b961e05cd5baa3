pub mod models;
pub mod rename;

use std::{error::Error, fmt::Display, fs, path::Path};

use serde::Deserialize;
use serde_json::{Map, Value};

use models::{GeoTable, Geometry, Row};

/// Parses a dataset file into a table of geometries and attributes.
pub trait DatasetReader {
    fn read(&self, path: &Path) -> anyhow::Result<GeoTable>;
}

/// Errors for files that are valid JSON but not a usable dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetError {
    /// The top-level `type` member is not `FeatureCollection`.
    NotFeatureCollection(String),
}

impl Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFeatureCollection(kind) => {
                write!(f, "expected a FeatureCollection, found {:?}", kind)
            }
        }
    }
}

impl Error for DatasetError {}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

impl From<Feature> for Row {
    fn from(feature: Feature) -> Self {
        Self {
            id: feature.id,
            geometry: feature.geometry,
            properties: feature.properties.unwrap_or_default(),
        }
    }
}

/// Reads GeoJSON feature collections.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoJsonReader;

impl GeoJsonReader {
    /// Parses a feature collection from raw bytes.
    pub fn parse(&self, bytes: &[u8]) -> anyhow::Result<GeoTable> {
        let collection: FeatureCollection = serde_json::from_slice(bytes)?;
        if collection.kind != "FeatureCollection" {
            anyhow::bail!(DatasetError::NotFeatureCollection(collection.kind));
        }
        Ok(collection.features.into_iter().map(Row::from).collect())
    }
}

impl DatasetReader for GeoJsonReader {
    fn read(&self, path: &Path) -> anyhow::Result<GeoTable> {
        let bytes = fs::read(path)?;
        let table = self.parse(&bytes)?;

        #[cfg(feature = "log")]
        log::debug!("Read {} features from {}", table.len(), path.display());
        Ok(table)
    }
}
