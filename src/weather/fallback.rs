//! Ordered fallback over provider adapters
//!
//! One driver serves every logical need: it walks the chain in order, bounds
//! each attempt by the time budget, keeps the first success and otherwise
//! resolves exhaustion with the synthetic generator.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::synthetic::SyntheticGenerator;
use super::{AdapterFailure, FetchNeed, WeatherAdapter};
use crate::models::{Observation, PointQuery, Provenance};

/// Default per-attempt budget
pub const DEFAULT_ATTEMPT_BUDGET: Duration = Duration::from_secs(12);

/// Outcome of one adapter attempt, kept for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub provenance: Provenance,
    pub failure: Option<AdapterFailure>,
    pub elapsed: Duration,
}

/// Settled result of one chain. Always carries an observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    pub need: FetchNeed,
    pub observation: Observation,
    pub attempts: Vec<AttemptRecord>,
    pub used_synthetic_fallback: bool,
}

impl ChainOutcome {
    /// Failed attempts as `(provider, failure kind)` pairs
    #[must_use]
    pub fn failures(&self) -> Vec<(Provenance, &'static str)> {
        self.attempts
            .iter()
            .filter_map(|attempt| {
                attempt
                    .failure
                    .as_ref()
                    .map(|failure| (attempt.provenance, failure.kind()))
            })
            .collect()
    }
}

/// Every real adapter in a chain failed. Never leaves this module.
struct AllSourcesExhausted {
    attempts: Vec<AttemptRecord>,
}

impl fmt::Display for AllSourcesExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all {} sources exhausted", self.attempts.len())?;
        for attempt in &self.attempts {
            if let Some(failure) = &attempt.failure {
                write!(f, "; {}: {}", attempt.provenance, failure)?;
            }
        }
        Ok(())
    }
}

/// Drives an adapter chain with a per-attempt time budget
#[derive(Debug, Clone)]
pub struct FallbackFetcher {
    budget: Duration,
    synthetic: SyntheticGenerator,
}

impl Default for FallbackFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPT_BUDGET)
    }
}

impl FallbackFetcher {
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            synthetic: SyntheticGenerator::new(),
        }
    }

    #[must_use]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub(crate) async fn attempt(&self, adapter: &dyn WeatherAdapter, query: &PointQuery) -> Result<Observation, AdapterFailure> {
        match tokio::time::timeout(self.budget, adapter.fetch(query, self.budget)).await {
            Ok(Ok(observation)) if observation.is_empty() => {
                Err(AdapterFailure::parse("adapter returned an empty observation"))
            }
            Ok(outcome) => outcome,
            Err(_) => Err(AdapterFailure::timeout(self.budget)),
        }
    }

    async fn try_chain(
        &self,
        chain: &[Arc<dyn WeatherAdapter>],
        query: &PointQuery,
    ) -> Result<(Observation, Vec<AttemptRecord>), AllSourcesExhausted> {
        let mut attempts = Vec::with_capacity(chain.len());

        for adapter in chain {
            let provenance = adapter.provenance();
            let start_time = Instant::now();
            debug!("Trying {} (budget {:.1}s)", provenance, self.budget.as_secs_f64());

            let outcome = self.attempt(adapter.as_ref(), query).await;
            let elapsed = start_time.elapsed();

            match outcome {
                Ok(observation) => {
                    info!("{} succeeded in {:.3}s", provenance, elapsed.as_secs_f64());
                    attempts.push(AttemptRecord {
                        provenance,
                        failure: None,
                        elapsed,
                    });
                    return Ok((observation, attempts));
                }
                Err(failure) => {
                    warn!("{} failed after {:.3}s: {}", provenance, elapsed.as_secs_f64(), failure);
                    attempts.push(AttemptRecord {
                        provenance,
                        failure: Some(failure),
                        elapsed,
                    });
                }
            }
        }

        Err(AllSourcesExhausted { attempts })
    }

    /// Run one chain to completion. Never fails and never returns an empty observation.
    #[instrument(name = "fallback_chain", skip(self, chain), fields(need = need.as_str(), adapters = chain.len()))]
    pub async fn run(
        &self,
        need: FetchNeed,
        chain: &[Arc<dyn WeatherAdapter>],
        query: &PointQuery,
    ) -> ChainOutcome {
        match self.try_chain(chain, query).await {
            Ok((observation, attempts)) => ChainOutcome {
                need,
                observation,
                attempts,
                used_synthetic_fallback: false,
            },
            Err(exhausted) => {
                warn!("{} chain: {}, using synthetic climatology", need.as_str(), exhausted);
                ChainOutcome {
                    need,
                    observation: self.synthetic.generate(query),
                    attempts: exhausted.attempts,
                    used_synthetic_fallback: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::weather::FetchOutcome;

    /// Scripted adapter counting its invocations
    struct ScriptedAdapter {
        provenance: Provenance,
        outcome: FetchOutcome,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedAdapter {
        fn ok(provenance: Provenance, temperature: f64) -> Arc<Self> {
            let mut observation = Observation::empty(provenance, Utc::now());
            observation.temperature_c = Some(temperature);
            Arc::new(Self {
                provenance,
                outcome: Ok(observation),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(provenance: Provenance, failure: AdapterFailure) -> Arc<Self> {
            Arc::new(Self {
                provenance,
                outcome: Err(failure),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow(provenance: Provenance, delay: Duration) -> Arc<Self> {
            let mut adapter = Self::ok(provenance, 1.0);
            Arc::get_mut(&mut adapter).unwrap().delay = delay;
            adapter
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherAdapter for ScriptedAdapter {
        fn provenance(&self) -> Provenance {
            self.provenance
        }

        async fn fetch(&self, _query: &PointQuery, _budget: Duration) -> FetchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcome.clone()
        }
    }

    fn query() -> PointQuery {
        PointQuery::parse(-33.87, 151.21, "2025-01-15").unwrap()
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let first = ScriptedAdapter::ok(Provenance::OpenMeteo, 30.0);
        let second = ScriptedAdapter::ok(Provenance::OpenWeatherMap, 10.0);
        let chain: Vec<Arc<dyn WeatherAdapter>> = vec![first.clone(), second.clone()];

        let outcome = FallbackFetcher::default().run(FetchNeed::Current, &chain, &query()).await;

        assert_eq!(outcome.observation.temperature_c, Some(30.0));
        assert_eq!(outcome.observation.provenance, Provenance::OpenMeteo);
        assert!(!outcome.used_synthetic_fallback);
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
        assert!(outcome.failures().is_empty());
    }

    #[tokio::test]
    async fn test_falls_through_to_next_adapter_once() {
        let first = ScriptedAdapter::failing(Provenance::PowerHourly, AdapterFailure::parse("bad json"));
        let second = ScriptedAdapter::ok(Provenance::PowerDaily, 18.0);
        let chain: Vec<Arc<dyn WeatherAdapter>> = vec![first.clone(), second.clone()];

        let outcome = FallbackFetcher::default().run(FetchNeed::Reanalysis, &chain, &query()).await;

        assert_eq!(outcome.observation.provenance, Provenance::PowerDaily);
        assert_eq!(first.calls(), 1);
        assert_eq!(outcome.failures(), vec![(Provenance::PowerHourly, "parse_error")]);
    }

    #[tokio::test]
    async fn test_all_failing_yields_synthetic() {
        let chain: Vec<Arc<dyn WeatherAdapter>> = vec![
            ScriptedAdapter::failing(Provenance::OpenMeteo, AdapterFailure::HttpError {
                status: Some(500),
                message: "Internal Server Error".into(),
            }),
            ScriptedAdapter::failing(Provenance::OpenWeatherMap, AdapterFailure::unauthorized("no key")),
        ];

        let outcome = FallbackFetcher::default().run(FetchNeed::Current, &chain, &query()).await;

        assert!(outcome.used_synthetic_fallback);
        assert_eq!(outcome.observation.provenance, Provenance::Synthetic);
        assert!(!outcome.observation.is_empty());
        assert_eq!(
            outcome.failures(),
            vec![(Provenance::OpenMeteo, "http_error"), (Provenance::OpenWeatherMap, "unauthorized")]
        );
    }

    #[tokio::test]
    async fn test_empty_chain_yields_synthetic() {
        let outcome = FallbackFetcher::default().run(FetchNeed::Reanalysis, &[], &query()).await;
        assert!(outcome.used_synthetic_fallback);
        assert!(outcome.attempts.is_empty());
    }

    #[tokio::test]
    async fn test_empty_success_is_rejected() {
        let empty = Arc::new(ScriptedAdapter {
            provenance: Provenance::OpenMeteo,
            outcome: Ok(Observation::empty(Provenance::OpenMeteo, Utc::now())),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        });
        let chain: Vec<Arc<dyn WeatherAdapter>> = vec![empty];

        let outcome = FallbackFetcher::default().run(FetchNeed::Current, &chain, &query()).await;
        assert!(outcome.used_synthetic_fallback);
        assert_eq!(outcome.failures(), vec![(Provenance::OpenMeteo, "parse_error")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_adapter_times_out_and_advances() {
        let slow = ScriptedAdapter::slow(Provenance::OpenMeteo, Duration::from_secs(60));
        let fallback = ScriptedAdapter::ok(Provenance::OpenWeatherMap, 12.0);
        let chain: Vec<Arc<dyn WeatherAdapter>> = vec![slow.clone(), fallback];

        let outcome = FallbackFetcher::new(Duration::from_secs(12))
            .run(FetchNeed::Current, &chain, &query())
            .await;

        assert_eq!(outcome.observation.provenance, Provenance::OpenWeatherMap);
        assert_eq!(outcome.failures(), vec![(Provenance::OpenMeteo, "timeout")]);
        assert_eq!(slow.calls(), 1);
    }
}
