//! Normalized provider readings and their provenance

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream source that produced an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Open-Meteo current conditions
    OpenMeteo,
    /// OpenWeatherMap current conditions (needs an API key)
    #[serde(rename = "openweathermap")]
    OpenWeatherMap,
    /// NASA POWER hourly reanalysis
    #[serde(rename = "nasa-power-hourly")]
    PowerHourly,
    /// NASA POWER daily reanalysis
    #[serde(rename = "nasa-power-daily")]
    PowerDaily,
    /// Deterministic climatology generator, used only when every real source failed
    Synthetic,
}

/// Quality tier of a source, used by the merge precedence table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    /// Live forecast-grade conditions
    Live,
    /// Reanalysis record for the target day
    Reanalysis,
    /// Synthetic fallback
    Synthetic,
}

impl Provenance {
    #[must_use]
    pub fn tier(self) -> SourceTier {
        match self {
            Provenance::OpenMeteo | Provenance::OpenWeatherMap => SourceTier::Live,
            Provenance::PowerHourly | Provenance::PowerDaily => SourceTier::Reanalysis,
            Provenance::Synthetic => SourceTier::Synthetic,
        }
    }

    #[must_use]
    pub fn is_synthetic(self) -> bool {
        self.tier() == SourceTier::Synthetic
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::OpenMeteo => "open-meteo",
            Provenance::OpenWeatherMap => "openweathermap",
            Provenance::PowerHourly => "nasa-power-hourly",
            Provenance::PowerDaily => "nasa-power-daily",
            Provenance::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single numeric field of an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Temperature,
    RelativeHumidity,
    WindSpeed,
    Precipitation,
    UvIndex,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Temperature,
        Field::RelativeHumidity,
        Field::WindSpeed,
        Field::Precipitation,
        Field::UvIndex,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Temperature => "temperature",
            Field::RelativeHumidity => "relative_humidity",
            Field::WindSpeed => "wind_speed",
            Field::Precipitation => "precipitation",
            Field::UvIndex => "uv_index",
        }
    }
}

/// One provider's normalized reading.
///
/// Every field is optional: `None` means the provider did not report a usable
/// value, which is never the same thing as a reading of zero.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Observation {
    /// Temperature in Celsius
    pub temperature_c: Option<f64>,
    /// Relative humidity in percent
    pub relative_humidity: Option<f64>,
    /// Wind speed in m/s
    pub wind_speed_ms: Option<f64>,
    /// Precipitation in mm
    pub precipitation_mm: Option<f64>,
    /// UV index
    pub uv_index: Option<f64>,
    /// Time the reading refers to
    pub timestamp: DateTime<Utc>,
    /// Source of this reading
    pub provenance: Provenance,
}

impl Observation {
    /// Create an observation with every field absent
    #[must_use]
    pub fn empty(provenance: Provenance, timestamp: DateTime<Utc>) -> Self {
        Self {
            temperature_c: None,
            relative_humidity: None,
            wind_speed_ms: None,
            precipitation_mm: None,
            uv_index: None,
            timestamp,
            provenance,
        }
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Temperature => self.temperature_c,
            Field::RelativeHumidity => self.relative_humidity,
            Field::WindSpeed => self.wind_speed_ms,
            Field::Precipitation => self.precipitation_mm,
            Field::UvIndex => self.uv_index,
        }
    }

    /// True when no field carries a value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|field| self.get(*field).is_none())
    }
}
