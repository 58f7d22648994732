//! Point-and-date query model

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ClimaError;

/// First day covered by the reanalysis record.
pub const EARLIEST_SUPPORTED_DATE: (i32, u32, u32) = (1981, 1, 1);

/// A validated location and target date
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PointQuery {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Target calendar date
    pub date: NaiveDate,
}

impl PointQuery {
    /// Create a query after checking coordinate ranges
    pub fn new(latitude: f64, longitude: f64, date: NaiveDate) -> Result<Self, ClimaError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ClimaError::invalid_input(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }

        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ClimaError::invalid_input(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }

        Ok(Self {
            latitude,
            longitude,
            date,
        })
    }

    /// Parse an ISO-8601 calendar date (`YYYY-MM-DD`) and build a query
    pub fn parse(latitude: f64, longitude: f64, date: &str) -> Result<Self, ClimaError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
            ClimaError::invalid_input(format!(
                "Invalid date format '{date}', expected YYYY-MM-DD"
            ))
        })?;
        Self::new(latitude, longitude, date)
    }

    /// Reject dates before the reanalysis record or too far past `today`
    pub fn ensure_within_window(&self, today: NaiveDate, max_days_ahead: u32) -> Result<(), ClimaError> {
        let (year, month, day) = EARLIEST_SUPPORTED_DATE;
        let earliest = NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN);
        if self.date < earliest {
            return Err(ClimaError::invalid_input(format!(
                "Date {} is before the earliest supported date {earliest}",
                self.date
            )));
        }

        let ahead = (self.date - today).num_days();
        if ahead > i64::from(max_days_ahead) {
            return Err(ClimaError::invalid_input(format!(
                "Date {} is {ahead} days ahead, at most {max_days_ahead} allowed",
                self.date
            )));
        }

        Ok(())
    }

    /// Format coordinates for logs and report metadata
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Compact `YYYYMMDD` form used by the reanalysis API
    #[must_use]
    pub fn compact_date(&self) -> String {
        format!(
            "{:04}{:02}{:02}",
            self.date.year(),
            self.date.month(),
            self.date.day()
        )
    }
}
