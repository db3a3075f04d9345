use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::history::{HistoryRequest, RateSample};

/// Abstraction over the remote market-data API.
///
/// The services only talk to this trait, so a different API (or a test
/// double) can be swapped in without touching them.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait MarketDataSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// The full asset list with current price and volume figures.
    async fn get_assets(&self) -> Result<Vec<Asset>, CoreError>;

    /// Historical closing rates for `request.asset_id` in `request.quote_id`.
    async fn get_rate_history(&self, request: &HistoryRequest) -> Result<Vec<RateSample>, CoreError>;
}
