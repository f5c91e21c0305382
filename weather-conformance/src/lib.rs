//! Conformance suite for the WeatherAPI.com current-weather and forecast endpoints.
//!
//! This crate focuses on:
//! - Data-provider rows and the checks run against each row
//! - Hard and soft assertions
//! - A small async suite runner with lifecycle listeners
//! - Per-test (or per-suite) log artifacts

pub mod assertions;
pub mod cases;
pub mod fixtures;
pub mod listener;
pub mod result;
pub mod suite;

pub use listener::{Granularity, ListenerConfig, LogListener, TestListener};
pub use result::{Param, TestResult, TestStatus};
pub use suite::{ConformanceTest, Suite, SuiteSummary};

/// Suite name used in log records.
pub const SUITE_NAME: &str = "weather-api-backend";
