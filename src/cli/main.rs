use std::{
    fs::{self, File},
    io::{self, Write},
};

use argument::Cli;
#[cfg(feature = "log")]
use campfetch::initialize_logging;
use campfetch::{fetcher::Config, CampDataFetcher, GeoTable};
use clap::Parser;

mod argument;

fn main() {
    if let Err(e) = run_application() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Builds the fetch configuration: config file first, then flags.
fn build_config(options: &Cli) -> anyhow::Result<Config> {
    let mut config = match &options.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::unhcr(),
    };

    if let Some(url) = &options.url {
        config.url = Some(url.clone());
    }
    if let Some(cache_path) = &options.cache_path {
        config.cache_path = cache_path.clone();
    }
    if let Some(timeout) = options.timeout {
        config.request_timeout = timeout.saturating_mul(1000);
    }
    if options.data_dir {
        config = config.in_data_dir()?;
    }
    Ok(config)
}

/// Deletes the cached dataset so the next fetch downloads it again.
///
/// # Returns
///
/// `true` when a cache file was removed.
fn refresh_cache(config: &Config) -> anyhow::Result<bool> {
    if !config.cache_path.exists() {
        return Ok(false);
    }
    #[cfg(feature = "log")]
    log::info!("Removing cached data: {}", config.cache_path.display());
    fs::remove_file(&config.cache_path)?;
    Ok(true)
}

fn write_table(table: GeoTable, options: &Cli, output: &mut dyn Write) -> anyhow::Result<()> {
    let limit = if options.limit > 0 {
        options.limit
    } else {
        table.len()
    };

    if options.format == "geojson" {
        let table: GeoTable = table.into_rows().into_iter().take(limit).collect();
        serde_json::to_writer_pretty(&mut *output, &table.to_geojson())?;
        output.write_all(b"\n")?;
        return Ok(());
    }

    let records = table.records().take(limit).collect::<Vec<_>>();
    if options.format == "json" {
        output.write_all(b"[\n")?;
    }
    for (index, record) in records.iter().enumerate() {
        let line = match options.format.as_str() {
            "text" => record.as_text(),
            "json" => {
                let mut json_output = String::from("  ");
                json_output.push_str(&record.as_json());
                if index + 1 < records.len() {
                    json_output.push(',');
                }
                json_output
            }
            _ => format!("{}", record),
        };
        output.write_all(line.as_bytes())?;
        output.write_all(b"\n")?;
    }
    if options.format == "json" {
        output.write_all(b"]\n")?;
    }
    Ok(())
}

fn run_application() -> anyhow::Result<()> {
    let options = Cli::parse();

    #[cfg(feature = "log")]
    {
        let log_level = match options.log_level.as_str() {
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Off,
        };
        initialize_logging(log_level)?;
    }

    let config = build_config(&options)?;
    if options.refresh {
        refresh_cache(&config)?;
    }

    let fetcher = CampDataFetcher::http(&config);
    let table = fetcher.fetch_blocking(&config)?;

    #[cfg(feature = "log")]
    log::debug!("Fetched {} camps with columns {:?}", table.len(), table.columns());

    match &options.output_file {
        Some(path) => {
            let mut file = File::options()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            write_table(table, &options, &mut file)
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_table(table, &options, &mut lock)
        }
    }
}
