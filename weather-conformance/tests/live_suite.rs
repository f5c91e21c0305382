//! Runs the full suite against the real WeatherAPI.com service.
//!
//! Requires network access and a config file; opt in with
//! `WEATHER_CONFORMANCE_LIVE=1` (optionally `WEATHER_CONFORMANCE_CONFIG=<path>`).

use std::{path::PathBuf, sync::Arc};

use weather_conformance::{Granularity, ListenerConfig, LogListener, SUITE_NAME, Suite, cases};
use weather_core::{Config, WeatherApi, WeatherApiClient, config::DEFAULT_CONFIG_FILE};

#[tokio::test]
async fn live_suite_passes() -> anyhow::Result<()> {
    if std::env::var("WEATHER_CONFORMANCE_LIVE").is_err() {
        return Ok(());
    }

    let path = std::env::var("WEATHER_CONFORMANCE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Config::load(path)?;
    let api: Arc<dyn WeatherApi> = Arc::new(WeatherApiClient::new(&config)?);

    let logs = tempfile::tempdir()?;
    let summary = Suite::new(SUITE_NAME)
        .with_tests(cases::all())
        .with_listener(Arc::new(LogListener::new(ListenerConfig {
            log_dir: logs.path().to_path_buf(),
            granularity: Granularity::PerSuite,
            ..ListenerConfig::default()
        })))
        .run(Ok(api))
        .await;

    assert!(summary.is_success(), "{summary}");
    Ok(())
}
