//! Single-shot JSON GET with typed failure classification

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::AdapterFailure;

/// Build the shared HTTP client used by every adapter
pub fn build_client(user_agent: &str) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .pool_max_idle_per_host(4)
        .build()
}

fn transport_failure(error: &reqwest::Error, budget: Duration) -> AdapterFailure {
    if error.is_timeout() {
        AdapterFailure::timeout(budget)
    } else if error.is_decode() {
        AdapterFailure::parse(error.to_string())
    } else {
        AdapterFailure::HttpError {
            status: error.status().map(|status| status.as_u16()),
            message: error.to_string(),
        }
    }
}

/// Issue exactly one GET and decode the body, mapping every outcome to a value
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    budget: Duration,
) -> Result<T, AdapterFailure> {
    let start_time = Instant::now();

    let response = client
        .get(url)
        .timeout(budget)
        .send()
        .await
        .map_err(|e| transport_failure(&e, budget))?;

    let status = response.status();
    debug!(
        "HTTP response received: {} in {:.3}s",
        status,
        start_time.elapsed().as_secs_f64()
    );

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        warn!("Provider rejected credentials (HTTP {})", status.as_u16());
        return Err(AdapterFailure::unauthorized(format!(
            "provider returned {status}"
        )));
    }

    if !status.is_success() {
        return Err(AdapterFailure::HttpError {
            status: Some(status.as_u16()),
            message: status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| transport_failure(&e, budget))
}
