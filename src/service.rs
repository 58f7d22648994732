//! Comfort-risk pipeline
//!
//! Validates the query, runs the current-conditions and reanalysis chains
//! concurrently, merges their observations, bias-corrects the live
//! temperature when a second reanalysis record allows it and scores the
//! result.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::bias::BiasCorrection;
use crate::config::ClimaConfig;
use crate::merge::merge;
use crate::metrics::DerivedMetrics;
use crate::models::{MergedSnapshot, Observation, PointQuery, ReportMeta, RiskReport};
use crate::scoring::{ScoredIndices, score_snapshot};
use crate::weather::{
    ChainOutcome, FallbackFetcher, FetchNeed, OpenMeteoAdapter, OpenWeatherMapAdapter,
    PowerDailyAdapter, PowerHourlyAdapter, WeatherAdapter, build_client,
};
use crate::ClimaError;

/// Orchestrates fetching, merging and scoring for one point and date
pub struct RiskService {
    current_chain: Vec<Arc<dyn WeatherAdapter>>,
    reanalysis_chain: Vec<Arc<dyn WeatherAdapter>>,
    /// Baseline record for the temperature bias estimate
    bias_baseline: Option<Arc<dyn WeatherAdapter>>,
    fetcher: FallbackFetcher,
    max_days_ahead: u32,
}

impl RiskService {
    #[must_use]
    pub fn new(
        current_chain: Vec<Arc<dyn WeatherAdapter>>,
        reanalysis_chain: Vec<Arc<dyn WeatherAdapter>>,
        fetcher: FallbackFetcher,
        max_days_ahead: u32,
    ) -> Self {
        Self {
            current_chain,
            reanalysis_chain,
            bias_baseline: None,
            fetcher,
            max_days_ahead,
        }
    }

    /// Use `adapter` as the baseline the reanalysis reading is compared against
    #[must_use]
    pub fn with_bias_baseline(mut self, adapter: Arc<dyn WeatherAdapter>) -> Self {
        self.bias_baseline = Some(adapter);
        self
    }

    /// Build the default chains from configuration, sharing one HTTP client
    pub fn from_config(config: &ClimaConfig) -> Result<Self> {
        let providers = &config.providers;
        let client = build_client(&providers.user_agent).context("Failed to build HTTP client")?;

        let current_chain: Vec<Arc<dyn WeatherAdapter>> = vec![
            Arc::new(OpenMeteoAdapter::new(client.clone(), &providers.open_meteo_url)),
            Arc::new(OpenWeatherMapAdapter::new(
                client.clone(),
                &providers.openweathermap_url,
                providers.openweathermap_api_key.clone(),
            )),
        ];
        let reanalysis_chain: Vec<Arc<dyn WeatherAdapter>> = vec![
            Arc::new(PowerHourlyAdapter::new(client.clone(), &providers.power_url)),
            Arc::new(PowerDailyAdapter::new(client.clone(), &providers.power_url)),
        ];

        Ok(Self::new(
            current_chain,
            reanalysis_chain,
            FallbackFetcher::new(providers.attempt_budget()),
            config.request.max_days_ahead,
        )
        .with_bias_baseline(Arc::new(PowerDailyAdapter::new(client, &providers.power_url))))
    }

    #[must_use]
    pub fn max_days_ahead(&self) -> u32 {
        self.max_days_ahead
    }

    /// Validate raw inputs and compute the report. Only invalid input can fail.
    pub async fn compute_risk(&self, lat: f64, lon: f64, date: &str) -> Result<RiskReport, ClimaError> {
        let query = PointQuery::parse(lat, lon, date)?;
        query.ensure_within_window(Utc::now().date_naive(), self.max_days_ahead)?;
        Ok(self.compute_for(&query).await)
    }

    /// Run the pipeline for an already validated query
    #[instrument(name = "compute_risk", skip(self), fields(lat = query.latitude, lon = query.longitude, date = %query.date))]
    pub async fn compute_for(&self, query: &PointQuery) -> RiskReport {
        let start_time = Instant::now();

        // Independent fetches; none can cancel or delay another
        let (current, reanalysis, baseline) = tokio::join!(
            self.fetcher.run(FetchNeed::Current, &self.current_chain, query),
            self.fetcher.run(FetchNeed::Reanalysis, &self.reanalysis_chain, query),
            self.fetch_bias_baseline(query),
        );

        let mut snapshot = merge(&[current.observation.clone(), reanalysis.observation.clone()]);
        let estimate = baseline
            .and_then(|baseline| BiasCorrection::estimate(&reanalysis.observation, &baseline));
        let correction = match estimate {
            Some(correction) if correction.apply(&mut snapshot) => Some(correction),
            _ => None,
        };

        let metrics = DerivedMetrics::from_snapshot(&snapshot);
        let scored = score_snapshot(&snapshot, &metrics);
        let report = build_report(query, &snapshot, &scored, &[&current, &reanalysis], correction.as_ref());

        info!(
            "Computed comfort risk for ({}) from {} in {:.3}s (heat {}, cold {}, wind {}, wet {})",
            query.format_coordinates(),
            report.meta.source,
            start_time.elapsed().as_secs_f64(),
            report.indices.heat.center,
            report.indices.cold.center,
            report.indices.wind.center,
            report.indices.wet.center
        );
        report
    }

    /// Single attempt at the bias baseline. A failure only disables the correction.
    async fn fetch_bias_baseline(&self, query: &PointQuery) -> Option<Observation> {
        let adapter = self.bias_baseline.as_ref()?;
        match self.fetcher.attempt(adapter.as_ref(), query).await {
            Ok(observation) => Some(observation),
            Err(failure) => {
                debug!("Bias baseline {} unavailable: {}", adapter.provenance(), failure);
                None
            }
        }
    }
}

fn build_notes(
    query: &PointQuery,
    snapshot: &MergedSnapshot,
    scored: &ScoredIndices,
    chains: &[&ChainOutcome],
    correction: Option<&BiasCorrection>,
) -> String {
    let mut notes = Vec::new();

    if snapshot.live_source_contributed() && query.date != Utc::now().date_naive() {
        notes.push("live conditions describe the current time, not the target date".to_string());
    }

    if let Some(correction) = correction {
        notes.push(correction.describe());
    }

    for chain in chains {
        for (provider, kind) in chain.failures() {
            notes.push(format!("{provider} unavailable ({kind})"));
        }
        if chain.used_synthetic_fallback {
            notes.push(format!("{} sources exhausted, synthetic climatology generated", chain.need.as_str()));
        }
    }

    let synthetic = snapshot.synthetic_fields();
    if !synthetic.is_empty() {
        let fields: Vec<&str> = synthetic.iter().map(|field| field.as_str()).collect();
        notes.push(format!("synthetic values used for {}", fields.join(", ")));
    }

    if !scored.unavailable.is_empty() {
        let hazards: Vec<&str> = scored.unavailable.iter().map(|hazard| hazard.as_str()).collect();
        notes.push(format!("no input data for {} risk, reported as 0", hazards.join(", ")));
    }

    if notes.is_empty() {
        "all fields from live or reanalysis sources".to_string()
    } else {
        notes.join("; ")
    }
}

fn build_report(
    query: &PointQuery,
    snapshot: &MergedSnapshot,
    scored: &ScoredIndices,
    chains: &[&ChainOutcome],
    correction: Option<&BiasCorrection>,
) -> RiskReport {
    let source = snapshot
        .contributing_sources()
        .iter()
        .map(|provenance| provenance.as_str())
        .collect::<Vec<_>>()
        .join("+");

    RiskReport {
        meta: ReportMeta {
            source,
            lat: query.latitude,
            lon: query.longitude,
            date: query.date.format("%Y-%m-%d").to_string(),
            notes: build_notes(query, snapshot, scored, chains, correction),
            used_synthetic_fallback: snapshot.used_synthetic_fallback(),
            synthetic_fields: snapshot.synthetic_fields(),
            unavailable: scored.unavailable.clone(),
            provenance: snapshot.provenance_map(),
        },
        indices: scored.indices,
    }
}
