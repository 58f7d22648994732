//! Logistic risk scoring with confidence bands

use tracing::debug;

use crate::metrics::DerivedMetrics;
use crate::models::{Hazard, MergedSnapshot, RiskIndex, RiskIndices};

/// Band half-width when a live forecast-grade source contributed
pub const LIVE_BAND: u8 = 15;
/// Band half-width otherwise, and for unavailable metrics
pub const DEFAULT_BAND: u8 = 10;

/// Logistic curve parameters of one hazard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardCurve {
    /// Metric value at which the risk is 50 %
    pub threshold: f64,
    pub scale: f64,
}

impl HazardCurve {
    /// Risk percentage in `[0, 100]` before rounding
    #[must_use]
    pub fn probability(&self, metric: f64) -> f64 {
        100.0 / (1.0 + (-(metric - self.threshold) / self.scale).exp())
    }
}

#[must_use]
pub fn curve(hazard: Hazard) -> HazardCurve {
    let (threshold, scale) = match hazard {
        Hazard::Heat => (35.0, 2.5),
        Hazard::Cold => (0.0, 2.5),
        Hazard::Wind => (10.0, 1.5),
        Hazard::Wet => (2.0, 2.0),
    };
    HazardCurve { threshold, scale }
}

/// Input metric for a hazard, `None` when it could not be derived
#[must_use]
pub fn hazard_metric(hazard: Hazard, metrics: &DerivedMetrics) -> Option<f64> {
    match hazard {
        Hazard::Heat => metrics.humidex_c,
        // Degrees of wind chill below 5 °C
        Hazard::Cold => metrics.wind_chill_c.map(|chill| 5.0 - chill),
        Hazard::Wind => metrics.wind_speed_ms,
        Hazard::Wet => metrics.precipitation_mm,
    }
}

#[must_use]
pub fn band_half_width(live_source_contributed: bool) -> u8 {
    if live_source_contributed { LIVE_BAND } else { DEFAULT_BAND }
}

/// Score one hazard. An absent metric scores 0 with the default band.
#[must_use]
pub fn score(hazard: Hazard, metric: Option<f64>, half_width: u8) -> RiskIndex {
    match metric {
        Some(value) => {
            let center = curve(hazard).probability(value).round().clamp(0.0, 100.0) as u8;
            RiskIndex::with_band(center, half_width)
        }
        None => RiskIndex::with_band(0, DEFAULT_BAND),
    }
}

/// Indices for all hazards plus the hazards that could not be scored
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredIndices {
    pub indices: RiskIndices,
    pub unavailable: Vec<Hazard>,
}

#[must_use]
pub fn score_snapshot(snapshot: &MergedSnapshot, metrics: &DerivedMetrics) -> ScoredIndices {
    let half_width = band_half_width(snapshot.live_source_contributed());
    let mut unavailable = Vec::new();

    let mut score_hazard = |hazard: Hazard| {
        let metric = hazard_metric(hazard, metrics);
        if metric.is_none() {
            debug!("No input for {} risk, scoring as unavailable", hazard);
            unavailable.push(hazard);
        }
        score(hazard, metric, half_width)
    };

    let indices = RiskIndices {
        heat: score_hazard(Hazard::Heat),
        cold: score_hazard(Hazard::Cold),
        wind: score_hazard(Hazard::Wind),
        wet: score_hazard(Hazard::Wet),
    };

    ScoredIndices {
        indices,
        unavailable,
    }
}
