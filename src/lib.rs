//! ClimaSphere - multi-source weather reconciliation and comfort risk scoring
//!
//! This library queries several unreliable weather providers with ordered
//! fallback, reconciles their readings field by field, derives apparent
//! temperature indices and turns them into bounded risk percentages that can be
//! shared through a URL-safe token.

pub mod api;
pub mod bias;
pub mod config;
pub mod error;
pub mod merge;
pub mod metrics;
pub mod models;
pub mod scoring;
pub mod service;
pub mod share;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use bias::BiasCorrection;
pub use config::ClimaConfig;
pub use error::ClimaError;
pub use metrics::DerivedMetrics;
pub use models::{
    Field, Hazard, MergedSnapshot, Observation, PointQuery, Provenance, RiskIndex, RiskIndices,
    RiskLevel, RiskReport,
};
pub use service::RiskService;
pub use share::DecodeError;
pub use weather::{AdapterFailure, FallbackFetcher, FetchNeed, WeatherAdapter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ClimaError>;
