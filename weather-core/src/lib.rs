//! Core library for the WeatherAPI.com conformance suite.
//!
//! This crate defines:
//! - Key/value configuration loading (`.properties` or TOML)
//! - The authenticated HTTP client for the current-weather and forecast endpoints
//! - The weakly typed response model the suite asserts on
//!
//! It is used by `weather-conformance`, but can also drive ad-hoc checks from other binaries.

pub mod client;
pub mod config;
pub mod error;
pub mod model;

pub use client::{WeatherApi, WeatherApiClient};
pub use config::Config;
pub use error::{ClientError, ConfigError};
pub use model::{ApiResponse, JsonBody};
