//! Data models for the ClimaSphere pipeline
//!
//! This module contains the core domain models organized by concern:
//! - Location: validated point-and-date queries
//! - Observation: normalized provider readings and provenance
//! - Snapshot: the reconciled per-field view after merging
//! - Risk: risk indices and the report handed to callers

pub mod location;
pub mod observation;
pub mod risk;
pub mod snapshot;

// Re-export all public types for convenient access
pub use location::PointQuery;
pub use observation::{Field, Observation, Provenance, SourceTier};
pub use risk::{Hazard, MAX_RISK, ReportMeta, RiskIndex, RiskIndices, RiskLevel, RiskReport};
pub use snapshot::{MergedField, MergedSnapshot};
