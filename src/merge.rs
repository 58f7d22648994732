//! Per-field reconciliation of observations from several sources
//!
//! Each field has its own ordered list of source tiers. The first observation
//! of the highest-ranked tier that carries a value for the field wins.

use crate::models::{Field, MergedField, MergedSnapshot, Observation, SourceTier};

const LIVE_FIRST: [SourceTier; 3] = [SourceTier::Live, SourceTier::Reanalysis, SourceTier::Synthetic];

// Wet risk is defined on daily totals; live providers only report short windows
const REANALYSIS_FIRST: [SourceTier; 3] = [SourceTier::Reanalysis, SourceTier::Live, SourceTier::Synthetic];

/// Ordered tier precedence for a field
#[must_use]
pub fn precedence(field: Field) -> &'static [SourceTier] {
    match field {
        Field::Precipitation => &REANALYSIS_FIRST,
        Field::Temperature | Field::RelativeHumidity | Field::WindSpeed | Field::UvIndex => &LIVE_FIRST,
    }
}

fn resolve(field: Field, observations: &[Observation]) -> Option<MergedField> {
    precedence(field).iter().find_map(|tier| {
        observations
            .iter()
            .filter(|observation| observation.provenance.tier() == *tier)
            .find_map(|observation| {
                observation.get(field).map(|value| MergedField {
                    value,
                    provenance: observation.provenance,
                })
            })
    })
}

/// Merge observations into one snapshot. Never fails; unmatched fields stay absent.
#[must_use]
pub fn merge(observations: &[Observation]) -> MergedSnapshot {
    let mut snapshot = MergedSnapshot::default();
    for field in Field::ALL {
        snapshot.set(field, resolve(field, observations));
    }
    snapshot
}
