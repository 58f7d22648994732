//! Open-Meteo current-conditions adapter (no API key required)

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use super::http::get_json;
use super::sanitize::sanitize_opt;
use super::{AdapterFailure, FetchOutcome, WeatherAdapter};
use crate::models::{Observation, PointQuery, Provenance};

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,precipitation,uv_index";

/// Live conditions from the Open-Meteo forecast endpoint
#[derive(Debug, Clone)]
pub struct OpenMeteoAdapter {
    client: Client,
    base_url: String,
}

impl OpenMeteoAdapter {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, query: &PointQuery) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}&current={CURRENT_FIELDS}&wind_speed_unit=ms&timezone=GMT",
            self.base_url, query.latitude, query.longitude
        )
    }
}

#[async_trait]
impl WeatherAdapter for OpenMeteoAdapter {
    fn provenance(&self) -> Provenance {
        Provenance::OpenMeteo
    }

    #[instrument(name = "open_meteo_fetch", level = "debug", skip(self), fields(lat = query.latitude, lon = query.longitude))]
    async fn fetch(&self, query: &PointQuery, budget: Duration) -> FetchOutcome {
        let url = self.url(query);
        debug!("OpenMeteo API request URL: {}", url);

        let response: openmeteo::ForecastResponse = get_json(&self.client, &url, budget).await?;
        let current = response
            .current
            .ok_or_else(|| AdapterFailure::parse("no current block in Open-Meteo response"))?;

        let observation = current.into_observation();
        if observation.is_empty() {
            return Err(AdapterFailure::parse("Open-Meteo returned no usable values"));
        }
        Ok(observation)
    }
}

/// `OpenMeteo` API response structures and conversion utilities
mod openmeteo {
    use super::{NaiveDateTime, Observation, Provenance, Utc, sanitize_opt};
    use serde::Deserialize;

    /// Current weather response from `OpenMeteo` API
    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub current: Option<CurrentData>,
    }

    /// Current weather data from `OpenMeteo`
    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        pub time: Option<String>,
        #[serde(rename = "temperature_2m")]
        pub temperature: Option<f64>,
        #[serde(rename = "relative_humidity_2m")]
        pub relative_humidity: Option<f64>,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: Option<f64>,
        pub precipitation: Option<f64>,
        pub uv_index: Option<f64>,
    }

    impl CurrentData {
        pub fn into_observation(self) -> Observation {
            let provider = Provenance::OpenMeteo;
            let timestamp = self
                .time
                .as_deref()
                .and_then(|time| NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M").ok())
                .map_or_else(Utc::now, |dt| dt.and_utc());

            Observation {
                temperature_c: sanitize_opt(self.temperature, provider),
                relative_humidity: sanitize_opt(self.relative_humidity, provider),
                wind_speed_ms: sanitize_opt(self.wind_speed, provider),
                precipitation_mm: sanitize_opt(self.precipitation, provider),
                uv_index: sanitize_opt(self.uv_index, provider),
                timestamp,
                provenance: provider,
            }
        }
    }
}
