use std::{fmt::Debug, time::Instant};

use async_trait::async_trait;
use reqwest::{Client, Url, header};

use crate::{config::Config, error::ClientError, model::ApiResponse};

/// The two WeatherAPI.com operations exercised by the conformance suite.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn current_weather(&self, location: &str) -> Result<ApiResponse, ClientError>;

    async fn weather_forecast(&self, location: &str, days: u32) -> Result<ApiResponse, ClientError>;
}

/// Authenticated HTTP client for WeatherAPI.com.
///
/// Stateless apart from the resolved endpoint URLs: no caching, no retries and no
/// timeout beyond reqwest's defaults. Any non-2xx status is returned as a normal
/// response so callers can assert on it.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: String,
    current_url: Url,
    forecast_url: Url,
    http: Client,
}

impl WeatherApiClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = Client::builder().build().map_err(ClientError::Builder)?;
        Ok(Self {
            api_key: config.api_key().to_string(),
            current_url: endpoint_url(config.base_url(), config.current_endpoint())?,
            forecast_url: endpoint_url(config.base_url(), config.forecast_endpoint())?,
            http,
        })
    }

    pub fn current_url(&self) -> &Url {
        &self.current_url
    }

    pub fn forecast_url(&self) -> &Url {
        &self.forecast_url
    }

    async fn get(
        &self,
        operation: &'static str,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse, ClientError> {
        let started = Instant::now();

        let res = self
            .http
            .get(url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(|source| ClientError::Body { operation, source })?;
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis();

        tracing::debug!(operation, status, elapsed_ms, "WeatherAPI call finished");

        Ok(ApiResponse { status, elapsed, body })
    }
}

#[async_trait]
impl WeatherApi for WeatherApiClient {
    async fn current_weather(&self, location: &str) -> Result<ApiResponse, ClientError> {
        self.get("current", &self.current_url, &[("q", location)]).await
    }

    async fn weather_forecast(&self, location: &str, days: u32) -> Result<ApiResponse, ClientError> {
        let days = days.to_string();
        self.get("forecast", &self.forecast_url, &[("q", location), ("days", days.as_str())])
            .await
    }
}

/// Joins base URL and endpoint path by concatenation, so a base path such as `/v1` is kept.
fn endpoint_url(base: &str, endpoint: &str) -> Result<Url, ClientError> {
    let joined = format!("{}/{}", base.trim_end_matches('/'), endpoint.trim_start_matches('/'));
    Url::parse(&joined).map_err(|e| ClientError::InvalidUrl { url: joined, message: e.to_string() })
}
