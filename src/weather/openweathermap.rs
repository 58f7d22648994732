//! OpenWeatherMap current-conditions adapter
//!
//! Needs a pre-supplied API key. A missing key is reported as
//! [`AdapterFailure::Unauthorized`] without touching the network, so the
//! fallback chain simply moves on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use super::http::get_json;
use super::sanitize::sanitize_opt;
use super::{AdapterFailure, FetchOutcome, WeatherAdapter};
use crate::models::{Observation, PointQuery, Provenance};

#[derive(Debug, Clone)]
pub struct OpenWeatherMapAdapter {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    dt: Option<i64>,
    main: Option<MainBlock>,
    wind: Option<WindBlock>,
    #[serde(default)]
    rain: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: Option<f64>,
}

impl OpenWeatherMapAdapter {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    fn url(&self, query: &PointQuery, api_key: &str) -> String {
        format!(
            "{}/weather?lat={}&lon={}&units=metric&appid={}",
            self.base_url,
            query.latitude,
            query.longitude,
            urlencoding::encode(api_key)
        )
    }
}

impl CurrentResponse {
    fn into_observation(self) -> Observation {
        let provider = Provenance::OpenWeatherMap;
        let timestamp = self
            .dt
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);

        // Rain is omitted entirely when nothing fell in the last hour
        let precipitation = self
            .rain
            .get("1h")
            .copied()
            // 3h totals are spread evenly to an hourly rate to match the 1h field
            .or_else(|| self.rain.get("3h").map(|mm| mm / 3.0))
            .or(Some(0.0).filter(|_| self.main.is_some()));

        Observation {
            temperature_c: sanitize_opt(self.main.as_ref().and_then(|m| m.temp), provider),
            relative_humidity: sanitize_opt(self.main.as_ref().and_then(|m| m.humidity), provider),
            wind_speed_ms: sanitize_opt(self.wind.and_then(|w| w.speed), provider),
            precipitation_mm: sanitize_opt(precipitation, provider),
            uv_index: None,
            timestamp,
            provenance: provider,
        }
    }
}

#[async_trait]
impl WeatherAdapter for OpenWeatherMapAdapter {
    fn provenance(&self) -> Provenance {
        Provenance::OpenWeatherMap
    }

    #[instrument(name = "openweathermap_fetch", level = "debug", skip(self), fields(lat = query.latitude, lon = query.longitude))]
    async fn fetch(&self, query: &PointQuery, budget: Duration) -> FetchOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("No OpenWeatherMap API key configured, skipping request");
            return Err(AdapterFailure::unauthorized("no API key configured"));
        };

        let response: CurrentResponse =
            get_json(&self.client, &self.url(query, api_key), budget).await?;

        let observation = response.into_observation();
        if observation.is_empty() {
            return Err(AdapterFailure::parse("OpenWeatherMap returned no usable values"));
        }
        Ok(observation)
    }
}
