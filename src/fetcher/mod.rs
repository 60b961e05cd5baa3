mod config;
mod events;

use std::{error::Error, fmt::Display, path::PathBuf, time::Duration};

pub use config::{Config, DEFAULT_CACHE_PATH, UNHCR_CAMPS_URL};
pub use events::{FetchEvent, LogObserver, Observer, Severity, SilentObserver};
use tokio::runtime;

use crate::{
    dataset::{
        models::GeoTable,
        rename::{ColumnMapping, CAMP_COLUMNS},
        DatasetReader, GeoJsonReader,
    },
    downloader::{Downloader, HttpDownloader},
};

/// Returned when the cache file is missing and no URL is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingUrl {
    pub cache_path: PathBuf,
}

impl Display for MissingUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no url configured and no cached dataset at {}",
            self.cache_path.display()
        )
    }
}

impl Error for MissingUrl {}

/// Fetches a camp dataset, caching the download on disk.
pub struct CampDataFetcher {
    downloader: Box<dyn Downloader + Send + Sync>, // Retrieves the dataset when the cache is cold.
    reader: Box<dyn DatasetReader + Send + Sync>,  // Parses the cached file.
    observer: Box<dyn Observer + Send + Sync>,     // Receives diagnostics.
    mapping: ColumnMapping,                        // Column normalization.
}

impl CampDataFetcher {
    /// Creates a new `CampDataFetcher` normalizing with [`CAMP_COLUMNS`].
    ///
    /// # Arguments
    ///
    /// * `downloader`: Retrieves the dataset when the cache file is missing.
    /// * `reader`: Parses the cache file into a table.
    /// * `observer`: Receives the diagnostics of every fetch.
    pub fn new(
        downloader: impl Downloader + Send + Sync + 'static,
        reader: impl DatasetReader + Send + Sync + 'static,
        observer: impl Observer + Send + Sync + 'static,
    ) -> Self {
        Self {
            downloader: Box::new(downloader),
            reader: Box::new(reader),
            observer: Box::new(observer),
            mapping: CAMP_COLUMNS,
        }
    }

    /// HTTP + GeoJSON fetcher using the timeout from `config`.
    pub fn http(config: &Config) -> Self {
        Self::new(
            HttpDownloader::new(Duration::from_millis(config.request_timeout)),
            GeoJsonReader,
            LogObserver,
        )
    }

    /// Replaces the column normalization applied after reading.
    ///
    /// # Arguments
    ///
    /// * `mapping`: Column renames used instead of [`CAMP_COLUMNS`].
    ///
    /// # Returns
    ///
    /// The fetcher with the new mapping.
    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Returns the normalized table for `config`.
    ///
    /// The dataset is downloaded only when no file exists at
    /// `config.cache_path`; an existing file is reused as is. Rows with
    /// non-point geometries are kept and reported through a single warning
    /// event.
    ///
    /// # Arguments
    ///
    /// * `config`: Source URL and cache location.
    ///
    /// # Returns
    ///
    /// The renamed table, or the download/parse error unchanged. Fails with
    /// [`MissingUrl`] when neither a cache file nor a URL is available.
    pub async fn fetch(&self, config: &Config) -> anyhow::Result<GeoTable> {
        let cache_path = config.cache_path.as_path();

        if cache_path.exists() {
            self.observer.notify(&FetchEvent::CacheHit { path: cache_path });
        } else {
            let Some(url) = config.url.as_deref() else {
                anyhow::bail!(MissingUrl {
                    cache_path: cache_path.to_path_buf(),
                });
            };
            self.observer.notify(&FetchEvent::Downloading {
                url,
                path: cache_path,
            });
            self.downloader.download(url, cache_path).await?;
        }

        let mut table = self.reader.read(cache_path)?;
        self.mapping.apply(&mut table);

        let count = table.non_point_count();
        if count > 0 {
            self.observer.notify(&FetchEvent::NonPointGeometry {
                count,
                total: table.len(),
            });
        }
        Ok(table)
    }

    /// Runs [`fetch`](Self::fetch) to completion on a current-thread runtime.
    ///
    /// # Arguments
    ///
    /// * `config`: Source URL and cache location.
    ///
    /// # Returns
    ///
    /// Same as [`fetch`](Self::fetch), plus runtime construction errors.
    pub fn fetch_blocking(&self, config: &Config) -> anyhow::Result<GeoTable> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.fetch(config))
    }
}

impl Default for CampDataFetcher {
    fn default() -> Self {
        Self::http(&Config::default())
    }
}
