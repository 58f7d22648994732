//! Weather data acquisition
//!
//! Provider adapters normalize each upstream API into an [`Observation`] or a
//! typed [`AdapterFailure`]. The fallback driver walks an ordered chain of
//! adapters for one logical need and ends in the synthetic generator, so a
//! chain always settles with data.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Observation, PointQuery, Provenance};

pub mod fallback;
mod http;
pub mod open_meteo;
pub mod openweathermap;
pub mod power;
pub mod sanitize;
pub mod synthetic;

pub use fallback::{AttemptRecord, ChainOutcome, FallbackFetcher};
pub use http::build_client;
pub use open_meteo::OpenMeteoAdapter;
pub use openweathermap::OpenWeatherMapAdapter;
pub use power::{PowerDailyAdapter, PowerHourlyAdapter};
pub use sanitize::{sanitize, sanitize_opt};
pub use synthetic::SyntheticGenerator;

/// Why a single adapter attempt produced no observation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterFailure {
    #[error("timed out after {budget_ms} ms")]
    Timeout { budget_ms: u64 },

    #[error("HTTP error{}: {message}", .status.map(|s| format!(" {s}")).unwrap_or_default())]
    HttpError { status: Option<u16>, message: String },

    #[error("parse error: {message}")]
    ParseError { message: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },
}

impl AdapterFailure {
    pub fn timeout(budget: Duration) -> Self {
        Self::Timeout {
            budget_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Stable machine-readable name of the failure class
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterFailure::Timeout { .. } => "timeout",
            AdapterFailure::HttpError { .. } => "http_error",
            AdapterFailure::ParseError { .. } => "parse_error",
            AdapterFailure::Unauthorized { .. } => "unauthorized",
        }
    }
}

/// Result of one adapter attempt. Never an unstructured error.
pub type FetchOutcome = std::result::Result<Observation, AdapterFailure>;

/// Logical data need served by one fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchNeed {
    /// Live conditions "now"
    Current,
    /// Whole-day reanalysis for the target date
    Reanalysis,
}

impl FetchNeed {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FetchNeed::Current => "current",
            FetchNeed::Reanalysis => "reanalysis",
        }
    }
}

/// An upstream weather provider.
///
/// Implementations make exactly one outbound request per call and never
/// retry; retries across providers belong to the fallback driver.
#[async_trait]
pub trait WeatherAdapter: Send + Sync {
    /// Identity used for provenance tagging and sanitization
    fn provenance(&self) -> Provenance;

    /// Fetch and normalize one reading within `budget`
    async fn fetch(&self, query: &PointQuery, budget: Duration) -> FetchOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        assert_eq!(AdapterFailure::timeout(Duration::from_secs(12)).kind(), "timeout");
        assert_eq!(AdapterFailure::parse("bad").kind(), "parse_error");
        assert_eq!(AdapterFailure::unauthorized("no key").kind(), "unauthorized");
        let http = AdapterFailure::HttpError {
            status: Some(503),
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(http.kind(), "http_error");
        assert_eq!(http.to_string(), "HTTP error 503: Service Unavailable");
    }

    #[test]
    fn test_timeout_message() {
        let failure = AdapterFailure::timeout(Duration::from_millis(1500));
        assert_eq!(failure.to_string(), "timed out after 1500 ms");
    }
}
