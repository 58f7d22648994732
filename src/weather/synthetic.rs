//! Last-resort climatology generator
//!
//! Produces plausible values from latitude, longitude and day of year when
//! every real provider in a chain has failed. Output is a pure function of the
//! query: the jitter RNG is seeded from the quantized inputs.

use chrono::{Datelike, NaiveTime};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use std::f64::consts::PI;

use crate::models::{Observation, PointQuery, Provenance};

/// Deterministic fallback tier of every chain
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticGenerator;

/// FNV-1a over the quantized query so equal inputs always give equal seeds
fn seed_for(query: &PointQuery) -> u64 {
    let parts = [
        (query.latitude * 1000.0).round() as i64,
        (query.longitude * 1000.0).round() as i64,
        i64::from(query.date.num_days_from_ce()),
    ];

    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for part in parts {
        for byte in part.to_le_bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

/// +1 at local midsummer, -1 at local midwinter
fn seasonal_factor(query: &PointQuery) -> f64 {
    // Northern-hemisphere warmest period peaks around day 200
    let phase = 2.0 * PI * (f64::from(query.date.ordinal()) - 200.0) / 365.25;
    let factor = phase.cos();
    if query.latitude < 0.0 { -factor } else { factor }
}

impl SyntheticGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Climatological estimate for the query, tagged [`Provenance::Synthetic`]
    #[must_use]
    pub fn generate(&self, query: &PointQuery) -> Observation {
        let mut rng = StdRng::seed_from_u64(seed_for(query));
        let abs_lat = query.latitude.abs();
        let season = seasonal_factor(query);

        let base_temperature = 28.0 - 0.35 * abs_lat;
        let amplitude = (0.25 * abs_lat).min(15.0);
        let temperature = base_temperature + amplitude * season + rng.random_range(-1.0..1.0);

        let humidity = (75.0 - 0.3 * abs_lat + rng.random_range(-5.0..5.0)).clamp(20.0, 100.0);
        let wind = (3.0 + 0.05 * abs_lat + rng.random_range(-0.5..0.5)).max(0.0);
        let precipitation = (3.0 * (-abs_lat / 30.0).exp() + rng.random_range(-0.5..0.5)).max(0.0);
        let uv = (12.0 * query.latitude.to_radians().cos() * (0.7 + 0.3 * season)).clamp(0.0, 14.0);

        Observation {
            temperature_c: Some(temperature),
            relative_humidity: Some(humidity),
            wind_speed_ms: Some(wind),
            precipitation_mm: Some(precipitation),
            uv_index: Some(uv),
            timestamp: query.date.and_time(NaiveTime::MIN).and_utc(),
            provenance: Provenance::Synthetic,
        }
    }
}
