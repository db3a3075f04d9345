use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One historical exchange-rate sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSample {
    pub time_period_start: DateTime<Utc>,
    pub rate_close: f64,
}

/// Sampling granularity, spelled the way the API's `period_id` expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "1MIN")]
    OneMinute,
    #[serde(rename = "1HRS")]
    OneHour,
    #[serde(rename = "1DAY")]
    OneDay,
    #[serde(rename = "7DAY")]
    OneWeek,
    #[serde(rename = "1MTH")]
    OneMonth,
}

impl HistoryPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPeriod::OneMinute => "1MIN",
            HistoryPeriod::OneHour => "1HRS",
            HistoryPeriod::OneDay => "1DAY",
            HistoryPeriod::OneWeek => "7DAY",
            HistoryPeriod::OneMonth => "1MTH",
        }
    }

    /// Pick a granularity that keeps a chart over `range` to a readable
    /// number of points.
    pub fn for_range(range: Duration) -> Self {
        if range <= Duration::hours(2) {
            HistoryPeriod::OneMinute
        } else if range <= Duration::days(2) {
            HistoryPeriod::OneHour
        } else if range <= Duration::days(90) {
            HistoryPeriod::OneDay
        } else if range <= Duration::days(730) {
            HistoryPeriod::OneWeek
        } else {
            HistoryPeriod::OneMonth
        }
    }
}

impl std::fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a price-history query.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub asset_id: String,
    /// Quote currency the rates are expressed in (e.g., "USD").
    pub quote_id: String,
    pub period: HistoryPeriod,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// A chart-ready price series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySeries {
    pub asset_id: String,
    pub quote_id: String,
    pub period: HistoryPeriod,
    /// Samples sorted by `time_period_start`, oldest first.
    pub samples: Vec<RateSample>,
    /// Change from the first to the last close, e.g. `"12.50%"` or `"N/A"`.
    pub change: String,
}

impl HistorySeries {
    pub fn first_close(&self) -> Option<f64> {
        self.samples.first().map(|s| s.rate_close)
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.samples.last().map(|s| s.rate_close)
    }
}
