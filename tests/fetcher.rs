use std::{
    error::Error,
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use campfetch::{
    fetcher::{FetchEvent, MissingUrl, Observer, Severity, SilentObserver},
    CampDataFetcher, ColumnMapping, Config, DatasetReader, Downloader, GeoJsonReader, GeoTable,
};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Download { url: String, path: PathBuf },
    Read(PathBuf),
}

#[derive(Debug, Clone, Default)]
struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    fn downloads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Download { .. }))
            .count()
    }
}

#[derive(Debug)]
struct Unreachable;

impl Display for Unreachable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "host unreachable")
    }
}

impl Error for Unreachable {}

/// Writes `body` to the target path, or fails with `Unreachable` when unset.
struct StubDownloader {
    log: CallLog,
    body: Option<String>,
}

#[async_trait]
impl Downloader for StubDownloader {
    async fn download(&self, url: &str, path: &Path) -> anyhow::Result<()> {
        self.log.push(Call::Download {
            url: url.to_owned(),
            path: path.to_path_buf(),
        });
        match &self.body {
            Some(body) => {
                fs::write(path, body)?;
                Ok(())
            }
            None => Err(Unreachable.into()),
        }
    }
}

struct RecordingReader {
    log: CallLog,
}

impl DatasetReader for RecordingReader {
    fn read(&self, path: &Path) -> anyhow::Result<GeoTable> {
        self.log.push(Call::Read(path.to_path_buf()));
        GeoJsonReader.read(path)
    }
}

#[derive(Clone, Default)]
struct RecordingObserver(Arc<Mutex<Vec<(Severity, String)>>>);

impl RecordingObserver {
    fn warnings(&self) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(severity, _)| *severity == Severity::Warn)
            .count()
    }

    fn messages(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl Observer for RecordingObserver {
    fn notify(&self, event: &FetchEvent<'_>) {
        self.0
            .lock()
            .unwrap()
            .push((event.severity(), event.to_string()));
    }
}

fn camps_geojson() -> String {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [40.31, 0.05]},
                "properties": {"name": "Dadaab", "Country": "Kenya", "Latitude": 0.05, "Longitude": 40.31}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [36.32, 32.29]},
                "properties": {"name": "Zaatari", "Country": "Jordan", "Latitude": 32.29, "Longitude": 36.32}
            }
        ]
    })
    .to_string()
}

fn fetcher(log: &CallLog, body: Option<String>) -> CampDataFetcher {
    CampDataFetcher::new(
        StubDownloader {
            log: log.clone(),
            body,
        },
        RecordingReader { log: log.clone() },
        SilentObserver,
    )
}

const URL: &str = "https://gis.example.org/camps?f=geojson";

#[tokio::test]
async fn second_fetch_reuses_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(URL).with_cache_path(dir.path().join("camps.geojson"));
    let log = CallLog::default();
    let observer = RecordingObserver::default();
    let fetcher = CampDataFetcher::new(
        StubDownloader {
            log: log.clone(),
            body: Some(camps_geojson()),
        },
        RecordingReader { log: log.clone() },
        observer.clone(),
    );

    let first = fetcher.fetch(&config).await.unwrap();
    assert_eq!(log.downloads(), 1);

    let second = fetcher.fetch(&config).await.unwrap();
    assert_eq!(log.downloads(), 1);
    assert_eq!(first, second);

    let messages = observer.messages();
    assert!(messages[0].starts_with("Downloading data from"));
    assert!(messages[1].starts_with("Using cached data:"));
}

#[tokio::test]
async fn existing_cache_is_never_downloaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camps.geojson");
    fs::write(&path, camps_geojson()).unwrap();

    let log = CallLog::default();
    let table = fetcher(&log, None)
        .fetch(&Config::new(URL).with_cache_path(&path))
        .await
        .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(log.calls(), vec![Call::Read(path)]);
}

#[tokio::test]
async fn downloads_before_reading_the_same_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camps.geojson");
    let log = CallLog::default();

    fetcher(&log, Some(camps_geojson()))
        .fetch(&Config::new(URL).with_cache_path(&path))
        .await
        .unwrap();

    assert_eq!(
        log.calls(),
        vec![
            Call::Download {
                url: URL.to_owned(),
                path: path.clone(),
            },
            Call::Read(path),
        ]
    );
}

#[tokio::test]
async fn download_failure_propagates_without_reading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camps.geojson");
    let log = CallLog::default();

    let err = fetcher(&log, None)
        .fetch(&Config::new(URL).with_cache_path(&path))
        .await
        .unwrap_err();

    assert!(err.downcast_ref::<Unreachable>().is_some());
    assert_eq!(log.downloads(), 1);
    assert!(!log.calls().iter().any(|call| matches!(call, Call::Read(_))));
    assert!(!path.exists());
}

#[tokio::test]
async fn parse_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::default();

    let err = fetcher(&log, Some("<html>Bad gateway</html>".to_owned()))
        .fetch(&Config::new(URL).with_cache_path(dir.path().join("camps.geojson")))
        .await
        .unwrap_err();

    assert!(err.downcast_ref::<serde_json::Error>().is_some());
}

#[tokio::test]
async fn missing_url_without_cache_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camps.geojson");
    let log = CallLog::default();

    let err = fetcher(&log, Some(camps_geojson()))
        .fetch(&Config::default().with_cache_path(&path))
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<MissingUrl>(),
        Some(&MissingUrl { cache_path: path })
    );
    assert!(log.calls().is_empty());
}

#[tokio::test]
async fn missing_url_is_fine_with_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camps.geojson");
    fs::write(&path, camps_geojson()).unwrap();

    let table = fetcher(&CallLog::default(), None)
        .fetch(&Config::default().with_cache_path(&path))
        .await
        .unwrap();
    assert_eq!(table.len(), 2);
}

#[tokio::test]
async fn renames_camp_columns() {
    let dir = tempfile::tempdir().unwrap();
    let table = fetcher(&CallLog::default(), Some(camps_geojson()))
        .fetch(&Config::new(URL).with_cache_path(dir.path().join("camps.geojson")))
        .await
        .unwrap();

    assert_eq!(table.columns(), vec!["camp_name", "country_name", "lat", "lon"]);
    assert_eq!(
        table.column("camp_name"),
        vec![Some(&json!("Dadaab")), Some(&json!("Zaatari"))]
    );
    assert_eq!(
        table.column("lon"),
        vec![Some(&json!(40.31)), Some(&json!(36.32))]
    );

    let records = table.records().collect::<Vec<_>>();
    assert_eq!(records[1].country_name.as_deref(), Some("Jordan"));
    assert_eq!(records[1].lat, Some(32.29));
}

#[tokio::test]
async fn custom_mapping_replaces_camp_columns() {
    const ISO: ColumnMapping = ColumnMapping::new(&[("Country", "country")]);
    let dir = tempfile::tempdir().unwrap();

    let table = fetcher(&CallLog::default(), Some(camps_geojson()))
        .with_mapping(ISO)
        .fetch(&Config::new(URL).with_cache_path(dir.path().join("camps.geojson")))
        .await
        .unwrap();

    assert_eq!(table.columns(), vec!["Latitude", "Longitude", "country", "name"]);
    assert_eq!(
        table.column("country"),
        vec![Some(&json!("Kenya")), Some(&json!("Jordan"))]
    );
}

#[tokio::test]
async fn missing_country_column_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let body = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [31.4, 2.9]},
            "properties": {"name": "Kiryandongo", "Latitude": 2.9, "Longitude": 31.4}
        }]
    })
    .to_string();

    let table = fetcher(&CallLog::default(), Some(body))
        .fetch(&Config::new(URL).with_cache_path(dir.path().join("camps.geojson")))
        .await
        .unwrap();

    assert_eq!(table.columns(), vec!["camp_name", "lat", "lon"]);
}

#[tokio::test]
async fn non_point_rows_are_kept_with_one_warning() {
    let dir = tempfile::tempdir().unwrap();
    let body = json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 1.0]}, "properties": {"name": "a"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [2.0, 2.0]}, "properties": {"name": "b"}},
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]},
                "properties": {"name": "c"}
            }
        ]
    })
    .to_string();

    let observer = RecordingObserver::default();
    let log = CallLog::default();
    let fetcher = CampDataFetcher::new(
        StubDownloader {
            log: log.clone(),
            body: Some(body),
        },
        RecordingReader { log },
        observer.clone(),
    );

    let table = fetcher
        .fetch(&Config::new(URL).with_cache_path(dir.path().join("camps.geojson")))
        .await
        .unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table.non_point_count(), 1);
    assert_eq!(observer.warnings(), 1);
}

#[tokio::test]
async fn points_only_emit_no_warning() {
    let dir = tempfile::tempdir().unwrap();
    let observer = RecordingObserver::default();
    let log = CallLog::default();
    let fetcher = CampDataFetcher::new(
        StubDownloader {
            log: log.clone(),
            body: Some(camps_geojson()),
        },
        RecordingReader { log },
        observer.clone(),
    );

    fetcher
        .fetch(&Config::new(URL).with_cache_path(dir.path().join("camps.geojson")))
        .await
        .unwrap();
    assert_eq!(observer.warnings(), 0);
}

#[test]
fn blocking_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let config = Config::new(URL).with_cache_path(dir.path().join("camps.geojson"));

    let table = fetcher(&log, Some(camps_geojson()))
        .fetch_blocking(&config)
        .unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(log.downloads(), 1);
}
