use std::{fmt::Display, path::Path};

/// How loudly an event should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
}

/// Diagnostics emitted while fetching a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchEvent<'a> {
    /// The cache file exists and is reused.
    CacheHit { path: &'a Path },
    /// The cache file is missing and the dataset is being downloaded.
    Downloading { url: &'a str, path: &'a Path },
    /// Some rows carry a geometry other than a point.
    NonPointGeometry { count: usize, total: usize },
}

impl FetchEvent<'_> {
    pub fn severity(&self) -> Severity {
        match self {
            Self::CacheHit { .. } | Self::Downloading { .. } => Severity::Info,
            Self::NonPointGeometry { .. } => Severity::Warn,
        }
    }
}

impl Display for FetchEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CacheHit { path } => write!(f, "Using cached data: {}", path.display()),
            Self::Downloading { url, path } => {
                write!(f, "Downloading data from {} to {}", url, path.display())
            }
            Self::NonPointGeometry { count, total } => write!(
                f,
                "Non-point geometries present in camp data ({} of {} rows)",
                count, total
            ),
        }
    }
}

/// Receives the diagnostics of a fetch.
pub trait Observer {
    fn notify(&self, event: &FetchEvent<'_>);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn notify(&self, event: &FetchEvent<'_>) {
        #[cfg(feature = "log")]
        match event.severity() {
            Severity::Info => log::info!("{}", event),
            Severity::Warn => log::warn!("{}", event),
        }
        #[cfg(not(feature = "log"))]
        match event.severity() {
            Severity::Info => eprintln!("{}", event),
            Severity::Warn => eprintln!("Warning: {}", event),
        }
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl Observer for SilentObserver {
    fn notify(&self, _event: &FetchEvent<'_>) {}
}
