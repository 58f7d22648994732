//! NASA POWER reanalysis adapters
//!
//! POWER reports missing cells as `-999` (or `-5994` for some derived
//! parameters) instead of omitting them, so every value goes through the
//! sanitizer before aggregation.

use async_trait::async_trait;
use chrono::NaiveTime;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, instrument};

use super::http::get_json;
use super::sanitize::sanitize;
use super::{AdapterFailure, FetchOutcome, WeatherAdapter};
use crate::models::{Observation, PointQuery, Provenance};

const HOURLY_PARAMETERS: &str = "T2M,RH2M,WS10M,PRECTOTCORR,ALLSKY_SFC_UV_INDEX";
const DAILY_PARAMETERS: &str = "T2M_MAX,T2M_MIN,RH2M,WS10M,PRECTOTCORR,ALLSKY_SFC_UV_INDEX";

#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: Option<PowerProperties>,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    parameter: Option<HashMap<String, BTreeMap<String, f64>>>,
}

/// Sanitized values of one POWER parameter, keyed by timestamp string
struct ParameterTable {
    parameters: HashMap<String, BTreeMap<String, f64>>,
    provider: Provenance,
}

impl ParameterTable {
    fn from_response(response: PowerResponse, provider: Provenance) -> Result<Self, AdapterFailure> {
        let parameters = response
            .properties
            .and_then(|properties| properties.parameter)
            .ok_or_else(|| AdapterFailure::parse("POWER response has no parameter block"))?;
        Ok(Self {
            parameters,
            provider,
        })
    }

    /// Sanitized values of `name` whose key starts with `prefix`
    fn values(&self, name: &str, prefix: &str) -> Vec<f64> {
        self.parameters
            .get(name)
            .map(|series| {
                series
                    .iter()
                    .filter(|(key, _)| key.starts_with(prefix))
                    .filter_map(|(_, value)| sanitize(*value, self.provider))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn value(&self, name: &str, key: &str) -> Option<f64> {
        self.parameters
            .get(name)
            .and_then(|series| series.get(key))
            .and_then(|value| sanitize(*value, self.provider))
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn sum(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum())
    }
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn point_url(base_url: &str, resolution: &str, parameters: &str, query: &PointQuery) -> String {
    let day = query.compact_date();
    format!(
        "{base_url}/temporal/{resolution}/point?parameters={parameters}&community=RE&longitude={}&latitude={}&start={day}&end={day}&format=JSON&time-standard=UTC",
        query.longitude, query.latitude
    )
}

fn finish(observation: Observation, provider: Provenance) -> FetchOutcome {
    if observation.is_empty() {
        debug!("{} returned only fill values", provider);
        return Err(AdapterFailure::parse(format!(
            "{provider} returned no usable values for the requested day"
        )));
    }
    Ok(observation)
}

/// Whole-day aggregate of the hourly POWER record
#[derive(Debug, Clone)]
pub struct PowerHourlyAdapter {
    client: Client,
    base_url: String,
}

impl PowerHourlyAdapter {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn aggregate(table: &ParameterTable, query: &PointQuery) -> Observation {
        let day = query.compact_date();
        Observation {
            temperature_c: mean(&table.values("T2M", &day)),
            relative_humidity: mean(&table.values("RH2M", &day)),
            wind_speed_ms: mean(&table.values("WS10M", &day)),
            precipitation_mm: sum(&table.values("PRECTOTCORR", &day)),
            uv_index: max(&table.values("ALLSKY_SFC_UV_INDEX", &day)),
            timestamp: query.date.and_time(NaiveTime::MIN).and_utc(),
            provenance: Provenance::PowerHourly,
        }
    }
}

#[async_trait]
impl WeatherAdapter for PowerHourlyAdapter {
    fn provenance(&self) -> Provenance {
        Provenance::PowerHourly
    }

    #[instrument(name = "power_hourly_fetch", level = "debug", skip(self), fields(lat = query.latitude, lon = query.longitude, date = %query.date))]
    async fn fetch(&self, query: &PointQuery, budget: Duration) -> FetchOutcome {
        let url = point_url(&self.base_url, "hourly", HOURLY_PARAMETERS, query);
        let response: PowerResponse = get_json(&self.client, &url, budget).await?;
        let table = ParameterTable::from_response(response, Provenance::PowerHourly)?;
        finish(Self::aggregate(&table, query), Provenance::PowerHourly)
    }
}

/// Daily POWER record for the target date
#[derive(Debug, Clone)]
pub struct PowerDailyAdapter {
    client: Client,
    base_url: String,
}

impl PowerDailyAdapter {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn extract(table: &ParameterTable, query: &PointQuery) -> Observation {
        let day = query.compact_date();
        // Daily mean temperature needs both extremes
        let temperature = match (table.value("T2M_MAX", &day), table.value("T2M_MIN", &day)) {
            (Some(max), Some(min)) => Some((max + min) / 2.0),
            _ => None,
        };

        Observation {
            temperature_c: temperature,
            relative_humidity: table.value("RH2M", &day),
            wind_speed_ms: table.value("WS10M", &day),
            precipitation_mm: table.value("PRECTOTCORR", &day),
            uv_index: table.value("ALLSKY_SFC_UV_INDEX", &day),
            timestamp: query.date.and_time(NaiveTime::MIN).and_utc(),
            provenance: Provenance::PowerDaily,
        }
    }
}

#[async_trait]
impl WeatherAdapter for PowerDailyAdapter {
    fn provenance(&self) -> Provenance {
        Provenance::PowerDaily
    }

    #[instrument(name = "power_daily_fetch", level = "debug", skip(self), fields(lat = query.latitude, lon = query.longitude, date = %query.date))]
    async fn fetch(&self, query: &PointQuery, budget: Duration) -> FetchOutcome {
        let url = point_url(&self.base_url, "daily", DAILY_PARAMETERS, query);
        let response: PowerResponse = get_json(&self.client, &url, budget).await?;
        let table = ParameterTable::from_response(response, Provenance::PowerDaily)?;
        finish(Self::extract(&table, query), Provenance::PowerDaily)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(json: serde_json::Value, provider: Provenance) -> ParameterTable {
        let response: PowerResponse = serde_json::from_value(json).unwrap();
        ParameterTable::from_response(response, provider).unwrap()
    }

    fn query() -> PointQuery {
        PointQuery::parse(-33.87, 151.21, "2024-02-10").unwrap()
    }

    #[test]
    fn test_hourly_aggregation_skips_sentinels() {
        let table = table(
            serde_json::json!({
                "properties": { "parameter": {
                    "T2M": { "2024021000": 20.0, "2024021001": -999.0, "2024021002": 24.0, "2024021100": 40.0 },
                    "RH2M": { "2024021000": 50.0, "2024021001": 70.0 },
                    "WS10M": { "2024021000": -5994.0 },
                    "PRECTOTCORR": { "2024021000": 0.5, "2024021001": 1.5, "2024021002": 0.0 },
                    "ALLSKY_SFC_UV_INDEX": { "2024021000": 0.0, "2024021001": 6.5 }
                }}
            }),
            Provenance::PowerHourly,
        );

        let observation = PowerHourlyAdapter::aggregate(&table, &query());
        assert_eq!(observation.temperature_c, Some(22.0));
        assert_eq!(observation.relative_humidity, Some(60.0));
        assert_eq!(observation.wind_speed_ms, None);
        assert_eq!(observation.precipitation_mm, Some(2.0));
        assert_eq!(observation.uv_index, Some(6.5));
        assert_eq!(observation.provenance, Provenance::PowerHourly);
    }

    #[test]
    fn test_daily_temperature_needs_both_extremes() {
        let table = table(
            serde_json::json!({
                "properties": { "parameter": {
                    "T2M_MAX": { "20240210": 30.0 },
                    "T2M_MIN": { "20240210": -999.0 },
                    "RH2M": { "20240210": 65.0 },
                    "PRECTOTCORR": { "20240210": 0.0 }
                }}
            }),
            Provenance::PowerDaily,
        );

        let observation = PowerDailyAdapter::extract(&table, &query());
        assert_eq!(observation.temperature_c, None);
        assert_eq!(observation.relative_humidity, Some(65.0));
        assert_eq!(observation.precipitation_mm, Some(0.0));
        assert_eq!(observation.wind_speed_ms, None);
    }

    #[test]
    fn test_daily_mean_temperature() {
        let table = table(
            serde_json::json!({
                "properties": { "parameter": {
                    "T2M_MAX": { "20240210": 30.0 },
                    "T2M_MIN": { "20240210": 20.0 }
                }}
            }),
            Provenance::PowerDaily,
        );
        let observation = PowerDailyAdapter::extract(&table, &query());
        assert_eq!(observation.temperature_c, Some(25.0));
    }

    #[test]
    fn test_all_fill_values_is_a_parse_failure() {
        let table = table(
            serde_json::json!({
                "properties": { "parameter": {
                    "T2M_MAX": { "20240210": -999.0 },
                    "T2M_MIN": { "20240210": -999.0 },
                    "RH2M": { "20240210": -999.0 }
                }}
            }),
            Provenance::PowerDaily,
        );
        let outcome = finish(PowerDailyAdapter::extract(&table, &query()), Provenance::PowerDaily);
        assert!(matches!(outcome, Err(AdapterFailure::ParseError { .. })));
    }

    #[test]
    fn test_missing_parameter_block() {
        let response: PowerResponse =
            serde_json::from_value(serde_json::json!({ "messages": ["bad request"] })).unwrap();
        assert!(ParameterTable::from_response(response, Provenance::PowerDaily).is_err());
    }

    #[test]
    fn test_point_url() {
        let url = point_url("https://power.larc.nasa.gov/api", "daily", DAILY_PARAMETERS, &query());
        assert!(url.starts_with("https://power.larc.nasa.gov/api/temporal/daily/point?parameters=T2M_MAX"));
        assert!(url.contains("start=20240210&end=20240210"));
        assert!(url.contains("longitude=151.21&latitude=-33.87"));
    }
}
