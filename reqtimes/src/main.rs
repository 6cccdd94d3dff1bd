use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use xlsutils_logging::{LogLevel, LogSettings};

mod config;
mod probe;

use config::ProbeConfig;
use probe::{Probe, ProbeError, ProbeOptions, Timings};

#[derive(Parser)]
#[command(name = "reqtimes")]
#[command(
    about = "Displays the total time to perform a HTTP(S) request, with DNS and connection times",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// HTTP or HTTPS URL to request
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Give up after this many seconds (default: wait indefinitely)
    #[arg(short, long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let settings = LogSettings::new(LogLevel::Error, "REQTIMES_LOG");

    let code = tracing::subscriber::with_default(settings.subscriber(), || execute(&cli));
    std::process::exit(code);
}

/// Run the probe and print its report or the error; returns the exit status
fn execute(cli: &Cli) -> i32 {
    match run(cli) {
        Ok(timings) => {
            println!("{}", timings);
            0
        }
        Err(err) => {
            eprintln!("{:#}", err);
            1
        }
    }
}

fn run(cli: &Cli) -> Result<Timings> {
    // Validate before touching config or network
    let raw = cli.url.as_deref().ok_or(ProbeError::MissingUrl)?;
    let url = probe::validate_url(raw)?;

    let config = ProbeConfig::load(cli.config.as_deref())?;
    let timeout = cli
        .timeout
        .map(Duration::from_secs)
        .or_else(|| config.timeout());

    let probe = Probe::new(ProbeOptions { timeout });
    Ok(probe.run(&url)?)
}
