use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{RiskIndices, RiskReport};
use crate::service::RiskService;
use crate::{ClimaError, share};

/// Default query point when the caller omits coordinates (Sydney)
const DEFAULT_LAT: f64 = -33.8688;
const DEFAULT_LON: f64 = 151.2093;

#[derive(Debug, Deserialize)]
pub struct RiskParams {
    #[serde(default = "default_lat")]
    pub lat: f64,
    #[serde(default = "default_lon")]
    pub lon: f64,
    pub date: String,
}

fn default_lat() -> f64 {
    DEFAULT_LAT
}

fn default_lon() -> f64 {
    DEFAULT_LON
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SharedResult {
    pub date: NaiveDate,
    pub indices: RiskIndices,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareToken {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl IntoResponse for ClimaError {
    fn into_response(self) -> Response {
        let status = match &self {
            ClimaError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ClimaError::Decode { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ClimaError::Config { .. } | ClimaError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!("Request failed with {}: {}", status, self);
        (
            status,
            Json(ApiError {
                error: self.user_message(),
            }),
        )
            .into_response()
    }
}

pub fn router(service: Arc<RiskService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/comfort-risk", get(comfort_risk))
        .route("/share", post(create_share))
        .route("/share/{token}", get(open_share))
        .with_state(service)
}

async fn health() -> &'static str {
    "ok"
}

async fn comfort_risk(
    State(service): State<Arc<RiskService>>,
    Query(params): Query<RiskParams>,
) -> Result<Json<RiskReport>, ClimaError> {
    let report = service
        .compute_risk(params.lat, params.lon, &params.date)
        .await?;
    Ok(Json(report))
}

async fn create_share(Json(payload): Json<SharedResult>) -> Result<Json<ShareToken>, ClimaError> {
    if let Some(hazard) = payload.indices.first_inconsistent() {
        let index = payload.indices.get(hazard);
        return Err(ClimaError::invalid_input(format!(
            "{hazard} index must satisfy low <= center <= high <= 100, got {}/{}/{}",
            index.low, index.center, index.high
        )));
    }
    Ok(Json(ShareToken {
        token: share::encode(&payload.indices, payload.date),
    }))
}

async fn open_share(Path(token): Path<String>) -> Result<Json<SharedResult>, ClimaError> {
    let (indices, date) = share::decode(&token)?;
    Ok(Json(SharedResult { date, indices }))
}
