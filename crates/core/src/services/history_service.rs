use chrono::{DateTime, Utc};
use log::warn;

use crate::errors::CoreError;
use crate::format::percentage_change;
use crate::models::history::{HistoryRequest, HistorySeries, RateSample};

/// Maximum history range in days (10 years).
pub const MAX_HISTORY_RANGE_DAYS: i64 = 3650;

/// Turns raw rate samples into chart-ready series.
///
/// The core computes the numbers; the frontend only renders them.
pub struct HistoryService;

impl HistoryService {
    pub fn new() -> Self {
        Self
    }

    /// Reject inverted ranges and ranges longer than [`MAX_HISTORY_RANGE_DAYS`].
    pub fn validate_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<(), CoreError> {
        if from > to {
            return Err(CoreError::ValidationError(format!(
                "'from' ({from}) must not be after 'to' ({to})"
            )));
        }
        let range_days = (to - from).num_days();
        if range_days > MAX_HISTORY_RANGE_DAYS {
            return Err(CoreError::ValidationError(format!(
                "History range of {range_days} days exceeds maximum of {MAX_HISTORY_RANGE_DAYS} days (10 years)"
            )));
        }
        Ok(())
    }

    /// Sort the samples oldest-first, drop unusable rates, and compute the
    /// first-to-last change.
    pub fn build_series(&self, request: &HistoryRequest, samples: Vec<RateSample>) -> HistorySeries {
        let total = samples.len();
        let mut samples: Vec<RateSample> = samples
            .into_iter()
            .filter(|s| s.rate_close.is_finite())
            .collect();
        if samples.len() != total {
            warn!(
                "Dropped {} non-finite samples for {}/{}",
                total - samples.len(),
                request.asset_id,
                request.quote_id
            );
        }
        samples.sort_by_key(|s| s.time_period_start);

        let change = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) if samples.len() >= 2 => {
                percentage_change(first.rate_close, last.rate_close)
            }
            _ => "N/A".to_string(),
        };

        HistorySeries {
            asset_id: request.asset_id.clone(),
            quote_id: request.quote_id.clone(),
            period: request.period,
            samples,
            change,
        }
    }
}

impl Default for HistoryService {
    fn default() -> Self {
        Self::new()
    }
}
