use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use weather_conformance::{
    Granularity, ListenerConfig, LogListener, SUITE_NAME, Suite, cases,
    listener::log_file::MAX_FILE_BYTES,
};
use weather_core::{Config, WeatherApi, WeatherApiClient, config::DEFAULT_CONFIG_FILE};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-conformance",
    version,
    about = "Conformance tests for the WeatherAPI.com current and forecast endpoints"
)]
pub struct Cli {
    /// Key/value config file (`.properties`, or `.toml`).
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory for log artifacts; emptied at the start of every run.
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// One log file per test invocation, or one for the whole run.
    #[arg(long, value_enum, default_value_t = Granularity::PerTest)]
    pub granularity: Granularity,

    /// Number of test invocations allowed in flight at once.
    #[arg(long, default_value_t = 1)]
    pub parallel: usize,

    /// Only run tests in these groups (repeatable), e.g. `--group smoke`.
    #[arg(long = "group")]
    pub groups: Vec<String>,

    /// Do not echo test records to the console.
    #[arg(long)]
    pub quiet: bool,

    /// Increase diagnostic verbosity (-v debug, -vv trace). `RUST_LOG` takes priority.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        init_tracing(self.verbose);

        let config = Config::load(&self.config)
            .with_context(|| format!("cannot start suite without {}", self.config.display()))?;

        let setup = WeatherApiClient::new(&config)
            .map(|client| Arc::new(client) as Arc<dyn WeatherApi>)
            .context("Failed to construct WeatherAPI client");

        let listener = Arc::new(LogListener::new(ListenerConfig {
            log_dir: self.log_dir,
            granularity: self.granularity,
            console: !self.quiet,
            max_file_bytes: MAX_FILE_BYTES,
        }));

        let suite = Suite::new(SUITE_NAME)
            .with_tests(cases::all())
            .with_listener(listener)
            .parallelism(self.parallel)
            .include_groups(self.groups);

        let summary = suite.run(setup).await;

        println!("===============================================");
        println!("{SUITE_NAME}");
        println!("{summary}");
        println!("===============================================");

        Ok(if summary.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }
}

// Priority: RUST_LOG env var > verbose flag > default (info)
fn init_tracing(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_layout() {
        let cli = Cli::parse_from(["weather-conformance"]);
        assert_eq!(cli.config, PathBuf::from("config.properties"));
        assert_eq!(cli.log_dir, PathBuf::from("logs"));
        assert_eq!(cli.granularity, Granularity::PerTest);
        assert_eq!(cli.parallel, 1);
        assert!(cli.groups.is_empty());
    }

    #[test]
    fn flags_are_parsed() {
        let cli = Cli::parse_from([
            "weather-conformance",
            "--config",
            "ci.toml",
            "--granularity",
            "per-suite",
            "--parallel",
            "3",
            "--group",
            "smoke",
            "--group",
            "regression",
            "--quiet",
            "-vv",
        ]);
        assert_eq!(cli.config, PathBuf::from("ci.toml"));
        assert_eq!(cli.granularity, Granularity::PerSuite);
        assert_eq!(cli.parallel, 3);
        assert_eq!(cli.groups, vec!["smoke", "regression"]);
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 2);
    }
}
