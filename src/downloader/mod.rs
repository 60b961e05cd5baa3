use std::{
    error::Error,
    ffi::OsString,
    fmt::{Display, Formatter},
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};
#[cfg(feature = "progress_bar")]
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
#[cfg(feature = "progress_bar")]
use colored::Colorize;
use http_body_util::{BodyExt, Empty};
use hyper::{body::Bytes, header, Request, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
#[cfg(feature = "progress_bar")]
use status_line::StatusLine;
use tokio::time;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 5;

/// Retrieves a URL into a local file.
#[async_trait]
pub trait Downloader {
    /// Downloads `url` and stores the body at `path`.
    ///
    /// # Arguments
    ///
    /// * `url`: The endpoint to retrieve.
    /// * `path`: Where the response body is written.
    ///
    /// # Returns
    ///
    /// `Ok(())` once the complete body is stored at `path`, or the transport error.
    async fn download(&self, url: &str, path: &Path) -> anyhow::Result<()>;
}

/// Returned when the server answers with a non-success status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusError {
    pub url: String,
    pub status: StatusCode,
}

impl Display for StatusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} responded with {}", self.url, self.status)
    }
}

impl Error for StatusError {}

#[cfg(feature = "progress_bar")]
/// Struct to manage and display progress for a running download.
struct Progress {
    name: String,          // File name shown in the status line.
    progress: AtomicUsize, // Bytes received so far.
    max: f64,              // Announced content length, 0 when unknown.
}

#[cfg(feature = "progress_bar")]
impl Display for Progress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let received = self.progress.load(Ordering::Relaxed);
        write!(
            f,
            "{} {} Downloading {}: ",
            format!("{}:", module_path!()).bright_blue(),
            "INFO".bright_blue(),
            self.name
        )?;
        if self.max > 0.0 {
            write!(f, "{:.2}%", (received as f64 / self.max) * 100.0)
        } else {
            write!(f, "{} KiB", received / 1024)
        }
    }
}

/// HTTP(S) downloader built on the hyper client.
pub struct HttpDownloader {
    client: Client<HttpsConnector<HttpConnector>, Empty<Bytes>>,
    request_timeout: Duration,
}

impl HttpDownloader {
    /// Creates a new `HttpDownloader`.
    ///
    /// # Arguments
    ///
    /// * `request_timeout`: Time before giving up, counted over the whole
    ///   transfer including redirects.
    ///
    /// # Returns
    ///
    /// A downloader sharing one hyper client across downloads.
    pub fn new(request_timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpsConnector::new());
        Self {
            client,
            request_timeout,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Follows redirects and streams the final response body into `path`.
    async fn transfer(&self, url: &str, path: &Path) -> anyhow::Result<()> {
        #[cfg(feature = "log")]
        let time_start = time::Instant::now();
        let mut uri: Uri = url.parse()?;
        let mut redirects = 0;

        let mut response = loop {
            let req = Request::builder()
                .uri(uri.clone())
                .header(header::USER_AGENT, USER_AGENT)
                .body(Empty::<Bytes>::new())?;
            let response = self.client.request(req).await?;

            if !response.status().is_redirection() {
                break response;
            }
            let Some(location) = response.headers().get(header::LOCATION) else {
                break response;
            };
            if redirects == MAX_REDIRECTS {
                anyhow::bail!("{}: stopped after {} redirects", url, MAX_REDIRECTS);
            }
            redirects += 1;
            uri = resolve_location(&uri, location.to_str()?)?;

            #[cfg(feature = "log")]
            log::debug!("Redirected to {}", uri);
        };

        if !response.status().is_success() {
            anyhow::bail!(StatusError {
                url: uri.to_string(),
                status: response.status(),
            });
        }

        #[cfg(feature = "progress_bar")]
        let max_size = if let Some(length) = response.headers().get(header::CONTENT_LENGTH) {
            length.to_str().map(|v| v.parse::<f64>().unwrap_or(0.0))?
        } else {
            0.0
        };

        #[cfg(feature = "progress_bar")]
        let status = StatusLine::new(Progress {
            name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            progress: AtomicUsize::new(0),
            max: max_size,
        });

        let mut received = 0;
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)?;

        while let Some(next) = response.frame().await {
            let frame = next?;
            if let Some(chunk) = frame.data_ref() {
                #[cfg(feature = "progress_bar")]
                status.progress.fetch_add(chunk.len(), Ordering::Relaxed);
                file.write_all(chunk)?;
                received += chunk.len();
            }
        }
        file.flush()?;

        #[cfg(feature = "log")]
        log::debug!(
            "Finished downloading {} ({} bytes) in {:?}",
            uri,
            received,
            time_start.elapsed()
        );
        Ok(())
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    /// Downloads into `<path>.part` first and moves it onto `path` once the
    /// body is complete. Missing parent directories are created.
    async fn download(&self, url: &str, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                fs::create_dir_all(parent)?;
            }
        }

        let partial = partial_path(path);
        let result = match time::timeout(self.request_timeout, self.transfer(url, &partial)).await
        {
            Ok(result) => result,
            Err(elapsed) => Err(elapsed.into()),
        };

        match result {
            Ok(()) => {
                fs::rename(&partial, path)?;
                Ok(())
            }
            Err(e) => {
                if partial.exists() {
                    fs::remove_file(&partial)?;
                }
                Err(e)
            }
        }
    }
}

/// Path of the in-progress download for `path`.
pub(crate) fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// Resolves a `Location` header against the URI that produced it.
pub(crate) fn resolve_location(base: &Uri, location: &str) -> anyhow::Result<Uri> {
    let target: Uri = location.parse()?;
    if target.scheme().is_some() {
        return Ok(target);
    }
    if !location.starts_with('/') {
        anyhow::bail!("unsupported relative redirect: {}", location);
    }

    let mut parts = base.clone().into_parts();
    parts.path_and_query = target.path_and_query().cloned();
    Ok(Uri::from_parts(parts)?)
}
