//! Risk indices and the report returned to callers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::observation::{Field, Provenance};

/// Upper bound of every risk percentage
pub const MAX_RISK: u8 = 100;

/// Comfort hazards scored by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hazard {
    Heat,
    Cold,
    Wind,
    Wet,
}

impl Hazard {
    pub const ALL: [Hazard; 4] = [Hazard::Heat, Hazard::Cold, Hazard::Wind, Hazard::Wet];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Hazard::Heat => "heat",
            Hazard::Cold => "cold",
            Hazard::Wind => "wind",
            Hazard::Wet => "wet",
        }
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A risk percentage with its uncertainty band.
///
/// Invariant: `low <= center <= high <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskIndex {
    pub center: u8,
    pub low: u8,
    pub high: u8,
}

impl RiskIndex {
    /// Build an index from a center and a symmetric band half-width, clamping to [0, 100]
    #[must_use]
    pub fn with_band(center: u8, half_width: u8) -> Self {
        let center = center.min(MAX_RISK);
        Self {
            center,
            low: center.saturating_sub(half_width),
            high: center.saturating_add(half_width).min(MAX_RISK),
        }
    }

    /// Whether `low <= center <= high <= 100` holds
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.low <= self.center && self.center <= self.high && self.high <= MAX_RISK
    }

    /// Traffic-light label used by the presentation layer
    #[must_use]
    pub fn level(&self) -> RiskLevel {
        match self.center {
            0..30 => RiskLevel::Green,
            30..60 => RiskLevel::Amber,
            _ => RiskLevel::Red,
        }
    }
}

/// Coarse classification of a risk center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Below 30
    Green,
    /// 30 to 59
    Amber,
    /// 60 and above
    Red,
}

/// The four named comfort indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskIndices {
    pub heat: RiskIndex,
    pub cold: RiskIndex,
    pub wind: RiskIndex,
    pub wet: RiskIndex,
}

impl RiskIndices {
    #[must_use]
    pub fn get(&self, hazard: Hazard) -> RiskIndex {
        match hazard {
            Hazard::Heat => self.heat,
            Hazard::Cold => self.cold,
            Hazard::Wind => self.wind,
            Hazard::Wet => self.wet,
        }
    }

    /// First hazard whose index breaks the band invariant, if any
    #[must_use]
    pub fn first_inconsistent(&self) -> Option<Hazard> {
        Hazard::ALL
            .into_iter()
            .find(|hazard| !self.get(*hazard).is_consistent())
    }
}

/// Metadata describing how a report was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    /// Contributing providers joined with `+`
    pub source: String,
    pub lat: f64,
    pub lon: f64,
    /// Target date, `YYYY-MM-DD`
    pub date: String,
    /// Human-readable data-quality notes
    pub notes: String,
    /// True if any merged field came from the synthetic generator
    pub used_synthetic_fallback: bool,
    /// Fields supplied by the synthetic generator
    pub synthetic_fields: Vec<Field>,
    /// Hazards whose input metric was unavailable and were scored as 0
    pub unavailable: Vec<Hazard>,
    /// Winning provider per field
    pub provenance: BTreeMap<Field, Provenance>,
}

/// Response of a risk computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub meta: ReportMeta,
    pub indices: RiskIndices,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(50, 10, 40, 60)]
    #[case(5, 10, 0, 15)]
    #[case(97, 15, 82, 100)]
    #[case(0, 10, 0, 10)]
    #[case(100, 15, 85, 100)]
    fn test_band_is_clamped(#[case] center: u8, #[case] width: u8, #[case] low: u8, #[case] high: u8) {
        let index = RiskIndex::with_band(center, width);
        assert_eq!(index, RiskIndex { center, low, high });
        assert!(index.low <= index.center && index.center <= index.high && index.high <= MAX_RISK);
    }

    #[test]
    fn test_center_above_range_is_clamped() {
        let index = RiskIndex::with_band(140, 10);
        assert_eq!(index.center, 100);
        assert_eq!(index.low, 90);
        assert_eq!(index.high, 100);
    }

    #[rstest]
    #[case(RiskIndex { center: 50, low: 40, high: 60 }, true)]
    #[case(RiskIndex { center: 100, low: 100, high: 100 }, true)]
    #[case(RiskIndex { center: 150, low: 140, high: 160 }, false)]
    #[case(RiskIndex { center: 150, low: 200, high: 3 }, false)]
    #[case(RiskIndex { center: 20, low: 30, high: 40 }, false)]
    fn test_band_consistency(#[case] index: RiskIndex, #[case] consistent: bool) {
        assert_eq!(index.is_consistent(), consistent);
    }

    #[test]
    fn test_first_inconsistent_hazard() {
        let mut indices = RiskIndices {
            heat: RiskIndex::with_band(10, 10),
            cold: RiskIndex::with_band(20, 10),
            wind: RiskIndex::with_band(30, 10),
            wet: RiskIndex::with_band(40, 10),
        };
        assert_eq!(indices.first_inconsistent(), None);

        indices.wind.center = 101;
        assert_eq!(indices.first_inconsistent(), Some(Hazard::Wind));
    }

    #[rstest]
    #[case(0, RiskLevel::Green)]
    #[case(29, RiskLevel::Green)]
    #[case(30, RiskLevel::Amber)]
    #[case(59, RiskLevel::Amber)]
    #[case(60, RiskLevel::Red)]
    fn test_risk_levels(#[case] center: u8, #[case] level: RiskLevel) {
        assert_eq!(RiskIndex::with_band(center, 10).level(), level);
    }

    #[test]
    fn test_meta_uses_camel_case() {
        let meta = ReportMeta {
            source: "open-meteo".to_string(),
            lat: 1.0,
            lon: 2.0,
            date: "2025-01-01".to_string(),
            notes: String::new(),
            used_synthetic_fallback: true,
            synthetic_fields: vec![Field::UvIndex],
            unavailable: vec![Hazard::Wet],
            provenance: BTreeMap::from([(Field::Temperature, Provenance::OpenMeteo)]),
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["usedSyntheticFallback"], true);
        assert_eq!(value["syntheticFields"][0], "uv_index");
        assert_eq!(value["unavailable"][0], "wet");
        assert_eq!(value["provenance"]["temperature"], "open-meteo");
    }
}
