//! Postal code to market resolver.
//!
//! Reads a headerless point file and a GeoJSON market file, joins them
//! spatially and writes the resolved rows.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use marketmap::config::{self, Config, ConfigSource, RawValue};
use marketmap::observer::TracingObserver;

#[derive(Parser, Debug)]
#[command(name = "marketmap")]
#[command(about = "Resolve postal code points to market regions")]
struct Args {
    /// Comma-separated column names of the point file, in file order
    #[arg(long)]
    columns: Option<String>,

    /// Headerless delimited point file (.gz accepted)
    #[arg(long, alias = "input_filepath")]
    input_filepath: Option<String>,

    /// GeoJSON market boundary file
    #[arg(long, alias = "market_filepath")]
    market_filepath: Option<String>,

    /// Where to write the resolved table
    #[arg(long, alias = "output_filepath")]
    output_filepath: Option<String>,

    /// Point file delimiter (default: tab)
    #[arg(long)]
    separator: Option<String>,

    /// Output file delimiter (default: comma)
    #[arg(long, alias = "output_separator")]
    output_separator: Option<String>,

    /// Run point lookups on all cores
    #[arg(long)]
    parallel: bool,

    /// TOML config file, skipped if it does not exist
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

impl Args {
    /// Flags given on the command line, as the highest-priority config source
    fn into_source(self) -> ConfigSource {
        let mut source = ConfigSource::new("command line");
        source.set_opt(config::COLUMNS, self.columns.map(RawValue::Text));
        source.set_opt(config::INPUT_FILEPATH, self.input_filepath.map(RawValue::Text));
        source.set_opt(config::MARKET_FILEPATH, self.market_filepath.map(RawValue::Text));
        source.set_opt(config::OUTPUT_FILEPATH, self.output_filepath.map(RawValue::Text));
        source.set_opt(config::SEPARATOR, self.separator.map(RawValue::Text));
        source.set_opt(
            config::OUTPUT_SEPARATOR,
            self.output_separator.map(RawValue::Text),
        );
        if self.parallel {
            source.set(config::PARALLEL, RawValue::Bool(true));
        }
        source
    }
}

fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {}", e);
    }

    let args = Args::parse();

    if let Err(err) = run(args) {
        error!("{:?}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    info!("Market resolver");

    let config_path = args.config.clone();
    let config = Config::load(args.into_source(), &config_path)
        .context("Missing or invalid configuration")?;

    info!("Points: {}", config.input_filepath.display());
    info!("Markets: {}", config.market_filepath.display());

    let summary = marketmap::run(&config, &TracingObserver).with_context(|| {
        format!(
            "Failed to resolve {} against {}",
            config.input_filepath.display(),
            config.market_filepath.display()
        )
    })?;

    info!(
        "Done: {} rows written to {}",
        summary.stats.output_rows,
        summary.output_filepath.display()
    );
    Ok(())
}
