use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use used_car_explorer::session::SessionConfig;
use used_car_explorer::{DatasetCache, Session};

/// Load a used-car listings file, apply a filter and print the dashboard as JSON
#[derive(Debug, Parser)]
#[command(name = "used-car-explorer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Listings file (.csv, .json, .parquet or .pq)
    data: PathBuf,

    /// Session JSON with optional "cleaning" and "filter" settings
    session: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.session {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };

    let cache = DatasetCache::new(&cli.data, config.cleaning);
    let table = cache.get()?;
    log::info!("Loaded {} listings from {}", table.len(), cli.data.display());

    let session = Session::from_config(table, &config);
    let dashboard = session.dashboard();
    log::info!(
        "{} of {} listings match the filter",
        dashboard.summary.count,
        session.table().len()
    );

    let json = serde_json::to_string_pretty(&dashboard).context("serializing dashboard")?;
    println!("{json}");
    Ok(())
}
