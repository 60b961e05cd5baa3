use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::utils::data_dir;

/// Cache location used when none is configured.
pub const DEFAULT_CACHE_PATH: &str = "data/unhcr/camps.geojson";

/// UNHCR persons-of-concern locations, queried as GeoJSON.
pub const UNHCR_CAMPS_URL: &str = "https://gis.unhcr.org/arcgis/rest/services/core_v2/wrl_prp_p_unhcr_PoC/FeatureServer/0/query?where=1%3D1&outFields=*&f=geojson";

/// Options for fetching a camp dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source endpoint; only needed while the cache file does not exist.
    pub url: Option<String>,
    /// Where the downloaded dataset is kept.
    pub cache_path: PathBuf,
    /// Timeout for the download in milliseconds.
    pub request_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            request_timeout: 60_000,
        }
    }
}

impl Config {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Configuration for the public UNHCR camp layer.
    pub fn unhcr() -> Self {
        Self::new(UNHCR_CAMPS_URL)
    }

    pub fn with_cache_path(mut self, cache_path: impl Into<PathBuf>) -> Self {
        self.cache_path = cache_path.into();
        self
    }

    /// Moves the cache file under the per-user data directory, keeping its
    /// file name.
    pub fn in_data_dir(mut self) -> anyhow::Result<Self> {
        let file_name = self
            .cache_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("camps.geojson"));
        self.cache_path = data_dir()?.join(file_name);
        Ok(self)
    }

    /// Loads a configuration from a JSON object. Missing keys keep their
    /// defaults and unknown keys are ignored.
    ///
    /// # Arguments
    ///
    /// * `path`: The JSON file to read.
    ///
    /// # Returns
    ///
    /// The parsed `Config`, or the IO/JSON error.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read(path)?;
        Ok(serde_json::from_slice(&contents)?)
    }
}
