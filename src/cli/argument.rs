use clap::builder::styling::AnsiColor;
use clap::builder::{PossibleValue, Styles};
use clap::Parser;

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Green.on_default())
        .literal(AnsiColor::BrightGreen.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
}

/// Download, cache and normalize refugee/IDP camp locations.
#[derive(Parser, Debug, Clone)]
#[command(version, styles = get_styles())]
pub struct Cli {
    /// GeoJSON endpoint. Defaults to the UNHCR persons-of-concern layer.
    #[arg(short, long)]
    pub url: Option<String>,

    /// Where the downloaded dataset is cached.
    #[arg(short, long)]
    pub cache_path: Option<std::path::PathBuf>,

    /// Keep the cache file in the user data directory.
    #[arg(long)]
    pub data_dir: bool,

    /// JSON file with `url`, `cache_path` and `request_timeout` keys. Flags override it.
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Delete the cached file before fetching.
    #[arg(long)]
    pub refresh: bool,

    /// Download timeout in seconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Log level for application output.
    #[arg(
        long = "log",
        default_value = "info",
        value_parser([
            PossibleValue::new("debug"),
            PossibleValue::new("info"),
            PossibleValue::new("warn"),
            PossibleValue::new("error"),
            PossibleValue::new("trace"),
            PossibleValue::new("off"),
        ])
    )]
    pub log_level: String,

    /// Output format for the results.
    #[arg(
        short,
        long,
        default_value = "default",
        value_parser([
            PossibleValue::new("default"),
            PossibleValue::new("text"),
            PossibleValue::new("json"),
            PossibleValue::new("geojson"),
        ])
    )]
    pub format: String,

    /// Maximum number of camps to print, 0 for all.
    #[arg(short, long, default_value = "0")]
    pub limit: usize,

    /// File path to save the results. If not provided, output will go to the console.
    #[arg(short, long)]
    pub output_file: Option<std::path::PathBuf>,
}
