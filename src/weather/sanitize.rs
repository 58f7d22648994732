//! Provider-aware removal of sentinel "missing value" codes

use crate::models::Provenance;

/// Fill values NASA POWER emits instead of omitting a reading
const POWER_SENTINELS: &[f64] = &[-999.0, -5994.0];

/// Sentinel codes used by a provider
#[must_use]
pub fn sentinels(provider: Provenance) -> &'static [f64] {
    match provider {
        Provenance::PowerHourly | Provenance::PowerDaily => POWER_SENTINELS,
        Provenance::OpenMeteo | Provenance::OpenWeatherMap | Provenance::Synthetic => &[],
    }
}

/// Return the value unchanged unless it is one of the provider's sentinel codes
#[must_use]
#[allow(clippy::float_cmp)]
pub fn sanitize(value: f64, provider: Provenance) -> Option<f64> {
    if sentinels(provider).iter().any(|sentinel| *sentinel == value) {
        None
    } else {
        Some(value)
    }
}

/// Sanitize a field that may already be missing from the payload
#[must_use]
pub fn sanitize_opt(value: Option<f64>, provider: Provenance) -> Option<f64> {
    value.and_then(|value| sanitize(value, provider))
}
