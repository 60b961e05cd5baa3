pub mod dataset;
pub mod downloader;
pub mod fetcher;

mod utils;

pub use dataset::{
    models::{CampRecord, GeoTable, Geometry, GeometryKind, Row},
    rename::{ColumnMapping, CAMP_COLUMNS},
    DatasetReader, GeoJsonReader,
};
pub use downloader::{Downloader, HttpDownloader};
pub use fetcher::{CampDataFetcher, Config};

/// Initializes the logging system for the application.
///
/// This function configures the logging system with the specified verbosity level.
///
/// # Arguments
///
/// * `log_level`: The desired verbosity level for logging. Determines which log messages will be displayed.
///
/// # Returns
///
/// A result indicating the success or failure of the logging setup.
#[cfg(feature = "log")]
pub fn initialize_logging(log_level: log::LevelFilter) -> anyhow::Result<()> {
    stderrlog::new()
        .module(module_path!()) // Only this crate's messages.
        .show_module_names(true)
        .verbosity(log_level)
        .init()?;
    Ok(())
}
