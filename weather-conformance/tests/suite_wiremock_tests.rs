//! End-to-end suite runs against a mock WeatherAPI.com server.

use std::{fs, path::Path, sync::Arc};

use serde_json::{Value, json};
use weather_conformance::{
    ConformanceTest, Granularity, ListenerConfig, LogListener, Param, Suite, SuiteSummary, cases,
    fixtures,
    listener::log_file::MAX_FILE_BYTES,
};
use weather_core::{Config, WeatherApi, WeatherApiClient};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn client_for(base: &str) -> anyhow::Result<Arc<dyn WeatherApi>> {
    let config = Config::from_map(
        [
            ("weather.api.key", "test-key"),
            ("weather.api.base.url", base),
            ("weather.api.current.endpoint", "/current.json"),
            ("weather.api.forecast.endpoint", "/forecast.json"),
        ],
        "inline",
    )?;
    Ok(Arc::new(WeatherApiClient::new(&config)?))
}

fn listener(dir: &Path, granularity: Granularity) -> Arc<LogListener> {
    Arc::new(LogListener::new(ListenerConfig {
        log_dir: dir.to_path_buf(),
        granularity,
        console: false,
        max_file_bytes: MAX_FILE_BYTES,
    }))
}

fn location(city: &str, country: &str) -> Value {
    json!({ "name": city, "country": country, "localtime": "2026-10-16 10:00" })
}

fn current(city: &str, country: &str) -> Value {
    json!({
        "location": location(city, country),
        "current": {
            "last_updated": "2026-10-16 09:45",
            "temp_c": 9.0,
            "condition": { "text": "Light rain" },
            "wind_kph": 20.2,
            "humidity": 87
        }
    })
}

async fn mount_healthy_api(server: &MockServer) {
    for case in fixtures::cities() {
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .and(query_param("q", case.city))
            .respond_with(ResponseTemplate::new(200).set_body_json(current(case.city, case.country)))
            .mount(server)
            .await;
    }
    for case in fixtures::forecasts() {
        let mut body = current(case.city, case.country);
        body["forecast"] = json!({ "forecastday": vec![json!({ "date": "2026-10-16" }); case.days as usize] });
        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .and(query_param("q", case.city))
            .and(query_param("days", case.days.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }
}

/// An address nothing listens on: bind an ephemeral port, then release it.
fn unused_local_addr() -> std::net::SocketAddr {
    let socket = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap()
}

fn read_logs(dir: &Path) -> Vec<(String, String)> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| (e.file_name().to_string_lossy().into_owned(), fs::read_to_string(e.path()).unwrap()))
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn healthy_api_passes_every_invocation() {
    let server = MockServer::start().await;
    mount_healthy_api(&server).await;
    let logs = tempfile::tempdir().unwrap();
    fs::write(logs.path().join("previous-run.log"), "stale").unwrap();
    let listener = listener(logs.path(), Granularity::PerTest);

    let summary = Suite::new("mock")
        .with_tests(cases::all())
        .with_listener(listener.clone())
        .run(client_for(&server.uri()))
        .await;

    assert_eq!(summary, SuiteSummary { run: 9, passed: 9, failed: 0, skipped: 0 });
    assert_eq!(listener.open_handles(), 0);
    assert_eq!(listener.handles_opened(), 9);
    assert_eq!(listener.handles_closed(), 9);

    let files = read_logs(logs.path());
    assert_eq!(files.len(), 9);
    assert!(files.iter().all(|(name, _)| name != "previous-run.log"));
    assert!(files.iter().any(|(name, _)| name.starts_with("weather_forecast_Berlin_Germany_5_")));
    assert!(files.iter().all(|(_, text)| text.contains("Test PASSED")));
}

#[tokio::test]
async fn wrong_country_marks_the_failing_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current("London", "Canada")))
        .mount(&server)
        .await;
    let logs = tempfile::tempdir().unwrap();

    let summary = Suite::new("mock")
        .with_test(cases::CurrentWeatherTest)
        .with_listener(listener(logs.path(), Granularity::PerSuite))
        .run(client_for(&server.uri()))
        .await;

    assert_eq!(summary.failed, 3);
    let files = read_logs(logs.path());
    assert_eq!(files.len(), 1);
    let text = &files[0].1;
    assert!(text.contains("  2. [String] United Kingdom [FAILED]"));
    assert!(text.contains("  1. [String] London\n"));
    assert!(text.contains("Failure Details: Location name should contain Berlin, but was London"));
}

#[tokio::test]
async fn transport_failure_is_recorded_without_parameter_marks() {
    let base = format!("http://{}", unused_local_addr());
    let logs = tempfile::tempdir().unwrap();

    let summary = Suite::new("mock")
        .with_test(cases::ForecastTest)
        .with_listener(listener(logs.path(), Granularity::PerSuite))
        .run(client_for(&base))
        .await;

    assert_eq!(summary, SuiteSummary { run: 3, passed: 0, failed: 3, skipped: 0 });
    let text = &read_logs(logs.path())[0].1;
    assert!(text.matches("Failed to send request to WeatherAPI.com (forecast)").count() >= 3);
    assert!(text.contains("Exception details: "));
    assert!(!text.contains("[FAILED]"));
}

#[tokio::test]
async fn parallel_run_keeps_one_log_per_invocation() {
    let server = MockServer::start().await;
    mount_healthy_api(&server).await;
    let logs = tempfile::tempdir().unwrap();
    let listener = listener(logs.path(), Granularity::PerTest);

    let summary = Suite::new("mock")
        .with_tests(cases::all())
        .with_listener(listener.clone())
        .parallelism(4)
        .include_groups(vec!["smoke".into()])
        .run(client_for(&server.uri()))
        .await;

    assert_eq!(summary, SuiteSummary { run: 6, passed: 6, failed: 0, skipped: 0 });
    assert_eq!(read_logs(logs.path()).len(), 6);
    assert_eq!(listener.open_handles(), 0);
}

#[tokio::test]
async fn unusable_log_dir_does_not_stop_the_run() {
    let server = MockServer::start().await;
    mount_healthy_api(&server).await;
    let scratch = tempfile::tempdir().unwrap();
    let not_a_dir = scratch.path().join("logs");
    fs::write(&not_a_dir, "plain file").unwrap();

    for granularity in [Granularity::PerTest, Granularity::PerSuite] {
        let listener = listener(&not_a_dir, granularity);

        let summary = Suite::new("mock")
            .with_test(cases::CurrentWeatherTest)
            .with_listener(listener.clone())
            .run(client_for(&server.uri()))
            .await;

        assert_eq!(summary, SuiteSummary { run: 3, passed: 3, failed: 0, skipped: 0 });
        assert_eq!(listener.handles_opened(), 0);
        assert_eq!(listener.open_handles(), 0);
    }
    assert_eq!(fs::read_to_string(&not_a_dir).unwrap(), "plain file");
}

#[tokio::test]
async fn oversized_forecast_row_is_sent_and_fails() {
    struct FifteenDays;

    #[async_trait::async_trait]
    impl ConformanceTest for FifteenDays {
        fn name(&self) -> &'static str {
            "weather_forecast"
        }

        fn description(&self) -> &'static str {
            "Forecast beyond the API's day limit"
        }

        fn groups(&self) -> &'static [&'static str] {
            &["smoke"]
        }

        fn rows(&self) -> Vec<Vec<Param>> {
            vec![vec!["London".into(), "United Kingdom".into(), Param::Count(15)]]
        }

        async fn run(&self, api: &dyn WeatherApi, params: &[Param]) -> anyhow::Result<()> {
            cases::ForecastTest.run(api, params).await
        }
    }

    let server = MockServer::start().await;
    let mut body = current("London", "United Kingdom");
    body["forecast"] = json!({ "forecastday": vec![json!({ "date": "2026-10-16" }); 14] });
    Mock::given(method("GET"))
        .and(path("/forecast.json"))
        .and(query_param("days", "15"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let summary = Suite::new("mock").with_test(FifteenDays).run(client_for(&server.uri())).await;

    assert_eq!(summary, SuiteSummary { run: 1, passed: 0, failed: 1, skipped: 0 });
    assert!(!summary.is_success());
}
