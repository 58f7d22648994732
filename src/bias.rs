//! Temperature bias correction
//!
//! Two reanalysis estimates of the same day's mean temperature rarely agree:
//! the hourly record averages every hour while the daily record only offers
//! the `(max + min) / 2` midrange. Their difference is applied to a live
//! temperature reading so it lines up with the hourly record.

use tracing::debug;

use crate::models::{MergedSnapshot, Observation, Provenance, SourceTier};

/// A temperature delta between a reference and a baseline reanalysis source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasCorrection {
    pub delta_c: f64,
    pub reference: Provenance,
    pub baseline: Provenance,
}

impl BiasCorrection {
    /// Estimate the delta `reference - baseline`.
    ///
    /// Both observations must be distinct reanalysis sources carrying a
    /// temperature, otherwise there is nothing to correct with.
    #[must_use]
    pub fn estimate(reference: &Observation, baseline: &Observation) -> Option<Self> {
        if reference.provenance == baseline.provenance
            || reference.provenance.tier() != SourceTier::Reanalysis
            || baseline.provenance.tier() != SourceTier::Reanalysis
        {
            return None;
        }

        let delta_c = reference.temperature_c? - baseline.temperature_c?;
        Some(Self {
            delta_c,
            reference: reference.provenance,
            baseline: baseline.provenance,
        })
    }

    /// Shift the merged temperature when it came from a live source.
    ///
    /// Returns whether the snapshot was changed.
    pub fn apply(&self, snapshot: &mut MergedSnapshot) -> bool {
        match snapshot.temperature_c.as_mut() {
            Some(temperature) if temperature.provenance.tier() == SourceTier::Live => {
                debug!(
                    "Correcting {} temperature {:.1} by {:+.2}",
                    temperature.provenance, temperature.value, self.delta_c
                );
                temperature.value += self.delta_c;
                true
            }
            _ => false,
        }
    }

    /// Human-readable description for report notes
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "live temperature bias-corrected by {:+.1} °C ({} mean vs {} midrange)",
            self.delta_c, self.reference, self.baseline
        )
    }
}
