//! Reconciled snapshot produced by the merge resolver

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::observation::{Field, Provenance, SourceTier};

/// A merged value together with the source that won precedence for it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedField {
    pub value: f64,
    pub provenance: Provenance,
}

impl MergedField {
    /// True only when the winning value came from the synthetic generator
    #[must_use]
    pub fn used_synthetic_fallback(&self) -> bool {
        self.provenance.is_synthetic()
    }
}

/// One value per logical field, each tagged with its provenance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedSnapshot {
    pub temperature_c: Option<MergedField>,
    pub relative_humidity: Option<MergedField>,
    pub wind_speed_ms: Option<MergedField>,
    pub precipitation_mm: Option<MergedField>,
    pub uv_index: Option<MergedField>,
}

impl MergedSnapshot {
    #[must_use]
    pub fn field(&self, field: Field) -> Option<MergedField> {
        match field {
            Field::Temperature => self.temperature_c,
            Field::RelativeHumidity => self.relative_humidity,
            Field::WindSpeed => self.wind_speed_ms,
            Field::Precipitation => self.precipitation_mm,
            Field::UvIndex => self.uv_index,
        }
    }

    pub(crate) fn set(&mut self, field: Field, value: Option<MergedField>) {
        let slot = match field {
            Field::Temperature => &mut self.temperature_c,
            Field::RelativeHumidity => &mut self.relative_humidity,
            Field::WindSpeed => &mut self.wind_speed_ms,
            Field::Precipitation => &mut self.precipitation_mm,
            Field::UvIndex => &mut self.uv_index,
        };
        *slot = value;
    }

    /// Raw value of a field, `None` when no source supplied it
    #[must_use]
    pub fn value(&self, field: Field) -> Option<f64> {
        self.field(field).map(|merged| merged.value)
    }

    /// Per-field synthetic flag
    #[must_use]
    pub fn used_synthetic_fallback_for(&self, field: Field) -> bool {
        self.field(field)
            .is_some_and(|merged| merged.used_synthetic_fallback())
    }

    /// True if any field was supplied by the synthetic generator
    #[must_use]
    pub fn used_synthetic_fallback(&self) -> bool {
        Field::ALL
            .iter()
            .any(|field| self.used_synthetic_fallback_for(*field))
    }

    /// Fields whose value traces back to the synthetic generator
    #[must_use]
    pub fn synthetic_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| self.used_synthetic_fallback_for(*field))
            .collect()
    }

    /// True when at least one field was won by a live forecast-grade source
    #[must_use]
    pub fn live_source_contributed(&self) -> bool {
        Field::ALL.iter().any(|field| {
            self.field(*field)
                .is_some_and(|merged| merged.provenance.tier() == SourceTier::Live)
        })
    }

    /// Field name to winning provider, for report metadata
    #[must_use]
    pub fn provenance_map(&self) -> BTreeMap<Field, Provenance> {
        Field::ALL
            .into_iter()
            .filter_map(|field| self.field(field).map(|merged| (field, merged.provenance)))
            .collect()
    }

    /// Distinct contributing providers in field order
    #[must_use]
    pub fn contributing_sources(&self) -> Vec<Provenance> {
        let mut sources = Vec::new();
        for field in Field::ALL {
            if let Some(merged) = self.field(field) {
                if !sources.contains(&merged.provenance) {
                    sources.push(merged.provenance);
                }
            }
        }
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(value: f64, provenance: Provenance) -> Option<MergedField> {
        Some(MergedField { value, provenance })
    }

    #[test]
    fn test_synthetic_flags_are_per_field() {
        let snapshot = MergedSnapshot {
            temperature_c: merged(21.0, Provenance::OpenMeteo),
            relative_humidity: merged(55.0, Provenance::Synthetic),
            wind_speed_ms: merged(3.0, Provenance::PowerDaily),
            precipitation_mm: None,
            uv_index: None,
        };

        assert!(!snapshot.used_synthetic_fallback_for(Field::Temperature));
        assert!(snapshot.used_synthetic_fallback_for(Field::RelativeHumidity));
        assert!(!snapshot.used_synthetic_fallback_for(Field::Precipitation));
        assert!(snapshot.used_synthetic_fallback());
        assert_eq!(snapshot.synthetic_fields(), vec![Field::RelativeHumidity]);
        assert!(snapshot.live_source_contributed());
        assert_eq!(
            snapshot.contributing_sources(),
            vec![Provenance::OpenMeteo, Provenance::Synthetic, Provenance::PowerDaily]
        );
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = MergedSnapshot::default();
        assert!(!snapshot.used_synthetic_fallback());
        assert!(!snapshot.live_source_contributed());
        assert!(snapshot.provenance_map().is_empty());
    }
}
