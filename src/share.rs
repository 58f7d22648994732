//! URL-safe share tokens for risk results
//!
//! A token carries only the date and the four risk centers as compact JSON in
//! unpadded URL-safe base64. Bands are not transported: decoding rebuilds them
//! as `center ± 10`.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{MAX_RISK, RiskIndex, RiskIndices};
use crate::scoring::DEFAULT_BAND;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Why a share token could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("share token is empty")]
    Empty,

    #[error("share token is not valid base64: {0}")]
    Encoding(String),

    #[error("share token payload is malformed: {0}")]
    Malformed(String),

    #[error("risk value {value} for '{key}' is outside 0..=100")]
    OutOfRange { key: &'static str, value: i64 },
}

#[derive(Debug, Serialize)]
struct EncodedPayload<'a> {
    d: &'a str,
    h: u8,
    c: u8,
    w: u8,
    r: u8,
}

// Wider integer type on the way in so out-of-range values are reported as such
#[derive(Debug, Deserialize)]
struct DecodedPayload {
    d: String,
    h: i64,
    c: i64,
    w: i64,
    r: i64,
}

/// Encode the risk centers and date into an opaque URL-safe token
#[must_use]
pub fn encode(indices: &RiskIndices, date: NaiveDate) -> String {
    let date = date.format(DATE_FORMAT).to_string();
    let payload = EncodedPayload {
        d: &date,
        h: indices.heat.center,
        c: indices.cold.center,
        w: indices.wind.center,
        r: indices.wet.center,
    };
    // Serializing a struct of a string and integers cannot fail
    let json = serde_json::to_vec(&payload).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

fn center(key: &'static str, value: i64) -> Result<RiskIndex, DecodeError> {
    u8::try_from(value)
        .ok()
        .filter(|center| *center <= MAX_RISK)
        .map(|center| RiskIndex::with_band(center, DEFAULT_BAND))
        .ok_or(DecodeError::OutOfRange { key, value })
}

/// Decode a token produced by [`encode`]. Total: every input yields a value or a [`DecodeError`].
pub fn decode(token: &str) -> Result<(RiskIndices, NaiveDate), DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| DecodeError::Encoding(e.to_string()))?;
    let payload: DecodedPayload =
        serde_json::from_slice(&bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let date = NaiveDate::parse_from_str(&payload.d, DATE_FORMAT)
        .map_err(|e| DecodeError::Malformed(format!("invalid date '{}': {e}", payload.d)))?;

    let indices = RiskIndices {
        heat: center("h", payload.h)?,
        cold: center("c", payload.c)?,
        wind: center("w", payload.w)?,
        wet: center("r", payload.r)?,
    };
    Ok((indices, date))
}
