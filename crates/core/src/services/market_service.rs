use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::future::Future;

use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::history::{HistoryPeriod, HistoryRequest, HistorySeries};
use crate::models::settings::Settings;
use crate::providers::traits::MarketDataSource;
use crate::services::history_service::HistoryService;

/// Outcome of the most recent asset fetch, as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatus {
    /// Nothing fetched yet.
    Idle,
    Success,
    /// The last fetch failed; the previous snapshot (if any) is still served.
    Error(String),
}

impl QueryStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, QueryStatus::Error(_))
    }
}

/// Keeps the latest asset snapshot from a [`MarketDataSource`] and decides
/// when it needs refetching.
///
/// Snapshot strategy:
/// - a snapshot younger than `stale_time_secs` is served as-is
/// - a stale or forced refresh refetches; on failure the old snapshot stays
/// - while offline nothing is fetched
pub struct MarketService<P> {
    source: P,
    settings: Settings,
    history_service: HistoryService,
    snapshot: Option<Vec<Asset>>,
    fetched_at: Option<DateTime<Utc>>,
    connected: bool,
    status: QueryStatus,
}

impl<P: MarketDataSource> MarketService<P> {
    pub fn new(source: P, settings: Settings) -> Self {
        Self {
            source,
            settings,
            history_service: HistoryService::new(),
            snapshot: None,
            fetched_at: None,
            connected: true,
            status: QueryStatus::Idle,
        }
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Connectivity as reported by the host platform.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn status(&self) -> &QueryStatus {
        &self.status
    }

    pub fn has_error(&self) -> bool {
        self.status.is_error()
    }

    /// The latest snapshot, if one was ever fetched.
    pub fn assets(&self) -> Option<&[Asset]> {
        self.snapshot.as_deref()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Install a snapshot obtained elsewhere (e.g., restored from a cache).
    pub fn set_snapshot(&mut self, assets: Vec<Asset>, fetched_at: DateTime<Utc>) {
        self.snapshot = Some(assets);
        self.fetched_at = Some(fetched_at);
        self.status = QueryStatus::Success;
    }

    /// `true` when there is no snapshot or it is older than the stale time.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.fetched_at {
            Some(at) if self.snapshot.is_some() => {
                let secs = i64::try_from(self.settings.stale_time_secs)
                    .unwrap_or(i64::MAX)
                    .min(i64::MAX / 1000);
                let stale_after = Duration::seconds(secs);
                now - at >= stale_after
            }
            _ => true,
        }
    }

    /// Refresh the asset snapshot if it is stale (or `force` is set).
    pub async fn refresh_assets(&mut self, force: bool) -> Result<&[Asset], CoreError> {
        self.refresh_assets_at(force, Utc::now()).await
    }

    /// [`MarketService::refresh_assets`] with an explicit clock.
    pub async fn refresh_assets_at(
        &mut self,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<&[Asset], CoreError> {
        if !self.connected {
            return Err(CoreError::Offline);
        }
        if !force && !self.is_stale(now) {
            return Ok(self.snapshot.as_deref().unwrap_or(&[]));
        }

        let provider = self.source.name().to_string();
        let result = retry(self.settings.max_attempts, "asset list", || {
            self.source.get_assets()
        })
        .await;

        match result {
            Ok(assets) => {
                info!("Fetched {} assets from {provider}", assets.len());
                self.snapshot = Some(assets);
                self.fetched_at = Some(now);
                self.status = QueryStatus::Success;
                Ok(self.snapshot.as_deref().unwrap_or(&[]))
            }
            Err(e) => {
                warn!("Asset refresh from {provider} failed: {e}");
                self.status = QueryStatus::Error(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch a price-history series for `asset_id` over `[from, to]`,
    /// quoted in the configured currency.
    pub async fn fetch_history(
        &self,
        asset_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<HistorySeries, CoreError> {
        self.history_service.validate_range(from, to)?;
        if !self.connected {
            return Err(CoreError::Offline);
        }

        let request = HistoryRequest {
            asset_id: asset_id.to_string(),
            quote_id: self.settings.quote_currency.clone(),
            period: HistoryPeriod::for_range(to - from),
            from,
            to,
        };
        let samples = retry(self.settings.max_attempts, "rate history", || {
            self.source.get_rate_history(&request)
        })
        .await?;

        Ok(self.history_service.build_series(&request, samples))
    }
}

/// Run `op` up to `max_attempts` times, retrying only retryable errors.
async fn retry<T, F, Fut>(max_attempts: u32, what: &str, mut op: F) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < attempts => {
                warn!("Fetching {what} failed (attempt {attempt}/{attempts}): {e}");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
