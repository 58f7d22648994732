//! Apparent-temperature proxies derived from a merged snapshot
//!
//! Absence propagates: a metric whose inputs are missing is `None`, never a
//! fabricated default.

use serde::{Deserialize, Serialize};

use crate::models::{Field, MergedSnapshot};

/// Magnus coefficients
const MAGNUS_A: f64 = 17.27;
const MAGNUS_B: f64 = 237.7;

/// Wind chill is only defined at or below this temperature (°C)
const WIND_CHILL_MAX_TEMPERATURE: f64 = 10.0;
/// ... and above this wind speed (km/h)
const WIND_CHILL_MIN_WIND_KMH: f64 = 4.8;

const MS_TO_KMH: f64 = 3.6;

/// Dew point in °C from temperature (°C) and relative humidity (%)
#[must_use]
pub fn dew_point(temperature_c: f64, relative_humidity: f64) -> f64 {
    // ln(0) is undefined; treat bone-dry air as a tiny positive humidity
    let rh = relative_humidity.max(1e-6);
    let gamma = (MAGNUS_A * temperature_c) / (MAGNUS_B + temperature_c) + (rh / 100.0).ln();
    (MAGNUS_B * gamma) / (MAGNUS_A - gamma)
}

/// Canadian humidex in °C
#[must_use]
pub fn humidex(temperature_c: f64, relative_humidity: f64) -> f64 {
    let dew = dew_point(temperature_c, relative_humidity);
    let vapour_pressure = 6.11 * (5417.7530 * (1.0 / 273.16 - 1.0 / (273.15 + dew))).exp();
    temperature_c + (5.0 / 9.0) * (vapour_pressure - 10.0)
}

/// Environment Canada wind chill in °C. Outside its domain the raw temperature is returned.
#[must_use]
pub fn wind_chill(temperature_c: f64, wind_speed_ms: f64) -> f64 {
    let wind_kmh = wind_speed_ms * MS_TO_KMH;
    if temperature_c > WIND_CHILL_MAX_TEMPERATURE || wind_kmh <= WIND_CHILL_MIN_WIND_KMH {
        return temperature_c;
    }
    let v = wind_kmh.powf(0.16);
    13.12 + 0.6215 * temperature_c - 11.37 * v + 0.3965 * temperature_c * v
}

/// Metrics the risk scorer consumes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub dew_point_c: Option<f64>,
    pub humidex_c: Option<f64>,
    pub wind_chill_c: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub precipitation_mm: Option<f64>,
}

impl DerivedMetrics {
    #[must_use]
    pub fn from_snapshot(snapshot: &MergedSnapshot) -> Self {
        let temperature = snapshot.value(Field::Temperature);
        let humidity = snapshot.value(Field::RelativeHumidity);
        let wind = snapshot.value(Field::WindSpeed);

        let thermo = temperature.zip(humidity);
        Self {
            dew_point_c: thermo.map(|(t, rh)| dew_point(t, rh)),
            humidex_c: thermo.map(|(t, rh)| humidex(t, rh)),
            wind_chill_c: temperature.zip(wind).map(|(t, v)| wind_chill(t, v)),
            wind_speed_ms: wind,
            precipitation_mm: snapshot.value(Field::Precipitation),
        }
    }
}
