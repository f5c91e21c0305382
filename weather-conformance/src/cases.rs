//! The WeatherAPI.com conformance checks.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, bail};
use async_trait::async_trait;
use weather_core::{ApiResponse, JsonBody, WeatherApi};

use crate::{
    assertions::{AssertionError, SoftAssertions, ensure, ensure_eq},
    fixtures,
    result::Param,
    suite::ConformanceTest,
};

pub const MAX_RESPONSE_TIME: Duration = Duration::from_millis(2000);

const SMOKE_CRITICAL: &[&str] = &["smoke", "critical"];

/// Status, latency, location name and country; all hard.
fn check_basics(
    response: &ApiResponse,
    what: &str,
    city: &str,
    country: &str,
) -> anyhow::Result<JsonBody> {
    ensure_eq(
        response.status,
        200,
        format!(
            "Failed to get {what} for {city}, {country}. (Status code: {})",
            response.status
        ),
    )?;
    ensure(
        response.elapsed < MAX_RESPONSE_TIME,
        format!(
            "Response time should be less than {} ms, but was {} ms",
            MAX_RESPONSE_TIME.as_millis(),
            response.elapsed_ms()
        ),
    )?;

    let body = response.json().with_context(|| format!("{what} response for {city} is not JSON"))?;
    check_location(&body, city, country)?;
    Ok(body)
}

fn check_location(body: &JsonBody, city: &str, country: &str) -> Result<(), AssertionError> {
    let location = body.string("location.name");
    let matches = location
        .as_deref()
        .is_some_and(|name| name.contains(city) || city.contains(name));
    ensure(
        matches,
        format!(
            "Location name should contain {city}, but was {}",
            location.as_deref().unwrap_or("null")
        ),
    )?;

    let actual_country = body.string("location.country").unwrap_or_else(|| "null".to_string());
    ensure_eq(
        actual_country.as_str(),
        country,
        format!("Country should match expected value. Expected: {country}, Actual: {actual_country}"),
    )
}

fn city_country(params: &[Param]) -> anyhow::Result<(&str, &str)> {
    let [city, country, ..] = params else {
        bail!("expected (city, country) parameters, got {}", params.len());
    };
    match (city.as_text(), country.as_text()) {
        (Some(city), Some(country)) => Ok((city, country)),
        _ => bail!("city and country parameters must be text"),
    }
}

/// Current weather for every `(city, country)` row.
#[derive(Debug, Default)]
pub struct CurrentWeatherTest;

#[async_trait]
impl ConformanceTest for CurrentWeatherTest {
    fn name(&self) -> &'static str {
        "current_weather"
    }

    fn description(&self) -> &'static str {
        "Verify the current weather response"
    }

    fn groups(&self) -> &'static [&'static str] {
        SMOKE_CRITICAL
    }

    fn rows(&self) -> Vec<Vec<Param>> {
        fixtures::cities().iter().map(fixtures::CityCase::params).collect()
    }

    async fn run(&self, api: &dyn WeatherApi, params: &[Param]) -> anyhow::Result<()> {
        let (city, country) = city_country(params)?;
        let response = api.current_weather(city).await?;
        let body = check_basics(&response, "weather", city, country)?;

        let mut soft = SoftAssertions::new();
        soft.present(&body, "current.last_updated", "Last updated timestamp should be present");
        soft.present(&body, "current.temp_c", "Current temperature should be present");
        soft.present(&body, "current.condition.text", "Current weather condition should be present");
        soft.present(&body, "current.wind_kph", "Current wind speed should be present");
        soft.present(&body, "current.humidity", "Current humidity should be present");
        soft.absent(
            &body,
            "forecast",
            "Forecast data should not be present in current weather response",
        );
        soft.assert_all()?;
        Ok(())
    }
}

/// Forecast for every `(city, country, days)` row.
#[derive(Debug, Default)]
pub struct ForecastTest;

#[async_trait]
impl ConformanceTest for ForecastTest {
    fn name(&self) -> &'static str {
        "weather_forecast"
    }

    fn description(&self) -> &'static str {
        "Verify the weather forecast response"
    }

    fn groups(&self) -> &'static [&'static str] {
        SMOKE_CRITICAL
    }

    fn rows(&self) -> Vec<Vec<Param>> {
        fixtures::forecasts().iter().map(fixtures::ForecastCase::params).collect()
    }

    async fn run(&self, api: &dyn WeatherApi, params: &[Param]) -> anyhow::Result<()> {
        let (city, country) = city_country(params)?;
        let Some(days) = params.get(2).and_then(Param::as_count) else {
            bail!("expected a day count as third parameter");
        };
        let response = api.weather_forecast(city, days).await?;
        let body = check_basics(&response, "forecast", city, country)?;

        let mut soft = SoftAssertions::new();
        soft.present(&body, "current", "Current weather data should be included in forecast response");
        soft.present(&body, "forecast", "Forecast object should be present");
        soft.present(&body, "forecast.forecastday", "Forecast days array should be present");

        let actual_days = body.list("forecast.forecastday").map_or(0, Vec::len);
        ensure(
            actual_days == days as usize,
            format!("Number of forecast days should be {days}, but was {actual_days}"),
        )?;

        soft.assert_all()?;
        Ok(())
    }
}

/// Two identical current-weather calls must agree on location name and country.
#[derive(Debug, Default)]
pub struct RepeatedCurrentWeatherTest;

#[async_trait]
impl ConformanceTest for RepeatedCurrentWeatherTest {
    fn name(&self) -> &'static str {
        "repeated_current_weather"
    }

    fn description(&self) -> &'static str {
        "Verify location fields are stable across identical requests"
    }

    fn groups(&self) -> &'static [&'static str] {
        &["regression"]
    }

    fn rows(&self) -> Vec<Vec<Param>> {
        fixtures::cities().iter().map(fixtures::CityCase::params).collect()
    }

    async fn run(&self, api: &dyn WeatherApi, params: &[Param]) -> anyhow::Result<()> {
        let (city, country) = city_country(params)?;

        let first = api.current_weather(city).await?;
        let first = check_basics(&first, "weather", city, country)?;
        let second = api.current_weather(city).await?;
        let second = check_basics(&second, "weather", city, country)?;

        for path in ["location.name", "location.country"] {
            let (a, b) = (first.string(path), second.string(path));
            ensure(a == b, format!("{path} changed between identical requests: {a:?} then {b:?}"))?;
        }
        Ok(())
    }
}

/// Every check, in the order they are run.
pub fn all() -> Vec<Arc<dyn ConformanceTest>> {
    vec![
        Arc::new(CurrentWeatherTest),
        Arc::new(ForecastTest),
        Arc::new(RepeatedCurrentWeatherTest),
    ]
}
