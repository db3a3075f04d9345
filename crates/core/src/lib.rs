pub mod errors;
pub mod format;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{DateTime, Utc};
use log::{error, info};
use models::{
    asset::{Asset, EnrichedAsset, ListedAsset},
    history::HistorySeries,
    selection::{PriceAlert, Selection, TriggeredAlert},
    settings::Settings,
};
use providers::{coinapi::CoinApiProvider, traits::MarketDataSource};
use services::{
    aggregation_service::AssetAggregator,
    market_service::{MarketService, QueryStatus},
};
use storage::{kv::KeyValueStore, selection_store::SelectionStore};

use errors::CoreError;

/// Decimal places used for the headline portfolio value.
const PORTFOLIO_VALUE_DECIMALS: usize = 2;

/// Main entry point for the crypto-portfolio core library.
///
/// Holds the explicit UI state (the in-memory [`Selection`]) alongside the
/// services that feed it. The [`SelectionStore`] stays the source of truth:
/// edits live in memory until saved, and cancelling reloads from storage.
#[must_use]
pub struct PortfolioTracker<P, S> {
    market: MarketService<P>,
    store: SelectionStore<S>,
    aggregator: AssetAggregator,
    selection: Selection,
    /// Tracks whether the selection was edited since the last save/load.
    dirty: bool,
}

impl<P, S> std::fmt::Debug for PortfolioTracker<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("holdings", &self.selection.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl<S: KeyValueStore> PortfolioTracker<CoinApiProvider, S> {
    /// Build a tracker backed by CoinAPI. Settings are validated first.
    pub fn with_coinapi(settings: Settings, backend: S) -> Result<Self, CoreError> {
        settings.validate()?;
        let provider = CoinApiProvider::new(&settings);
        Ok(Self::new(settings, provider, backend))
    }
}

impl<P: MarketDataSource, S: KeyValueStore> PortfolioTracker<P, S> {
    /// Create a tracker and load the persisted selection.
    pub fn new(settings: Settings, source: P, backend: S) -> Self {
        let store = SelectionStore::new(backend);
        let selection = store.load();
        Self {
            market: MarketService::new(source, settings),
            store,
            aggregator: AssetAggregator::new(),
            selection,
            dirty: false,
        }
    }

    // ── Selection ───────────────────────────────────────────────────

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Replace the in-memory selection with what is stored.
    pub fn reload_selection(&mut self) {
        self.selection = self.store.load();
        self.dirty = false;
    }

    /// Set a quantity from text-field input. `"0"` (or anything that parses
    /// to zero) removes the holding.
    pub fn update_quantity(&mut self, asset_id: &str, text: &str) {
        self.selection.update_quantity(asset_id, text);
        self.dirty = true;
    }

    pub fn increment_quantity(&mut self, asset_id: &str) {
        self.selection.increment(asset_id);
        self.dirty = true;
    }

    /// Decrease by one; reaching zero removes the holding.
    pub fn decrement_quantity(&mut self, asset_id: &str) {
        self.selection.decrement(asset_id);
        self.dirty = true;
    }

    /// Set or clear the price alert of a held asset and persist immediately.
    ///
    /// Unlike [`PortfolioTracker::save_selection`], failures are returned so
    /// the caller can tell the user. On failure the in-memory selection is
    /// left as it was.
    ///
    /// The whole selection is written, pending quantity edits included, and
    /// the tracker is marked clean. A later [`PortfolioTracker::cancel_edits`]
    /// therefore cannot roll back edits made before the alert was saved.
    pub fn save_price_alert(&mut self, asset_id: &str, alert: PriceAlert) -> Result<(), CoreError> {
        let mut updated = self.selection.clone();
        updated.set_price_alert(asset_id, alert)?;
        self.store.save(&updated)?;
        info!("Saved price alert for {asset_id}");
        self.selection = updated;
        self.dirty = false;
        Ok(())
    }

    /// Persist the whole selection, as done when the editing screen closes.
    ///
    /// Errors are logged and swallowed; returns `false` if the save failed.
    pub fn save_selection(&mut self) -> bool {
        match self.store.save(&self.selection) {
            Ok(()) => {
                self.dirty = false;
                true
            }
            Err(e) => {
                error!("Failed to save holdings: {e}");
                false
            }
        }
    }

    /// Discard unsaved edits.
    pub fn cancel_edits(&mut self) {
        self.reload_selection();
    }

    /// Returns `true` if the selection was edited since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // ── Holdings & Value ────────────────────────────────────────────

    /// Held assets from the current snapshot with quantity and per-row total.
    #[must_use]
    pub fn holdings(&self) -> Vec<EnrichedAsset> {
        self.aggregator
            .filtered_holdings(self.snapshot(), &self.selection)
    }

    /// Sum of price × quantity. 0 when no snapshot has been fetched.
    #[must_use]
    pub fn portfolio_value(&self) -> f64 {
        self.aggregator
            .total_portfolio_value(self.snapshot(), &self.selection)
    }

    /// [`PortfolioTracker::portfolio_value`] formatted for display (e.g. `"1.25M"`).
    #[must_use]
    pub fn portfolio_value_display(&self) -> String {
        format::format_number(self.portfolio_value(), PORTFOLIO_VALUE_DECIMALS)
    }

    /// Assets the user can pick from (non-zero daily volume).
    #[must_use]
    pub fn selectable_assets(&self) -> Vec<ListedAsset> {
        self.aggregator.assets_with_non_zero_volume(self.snapshot())
    }

    #[must_use]
    pub fn triggered_alerts(&self) -> Vec<TriggeredAlert> {
        self.aggregator
            .triggered_alerts(self.snapshot(), &self.selection)
    }

    // ── Market Data ─────────────────────────────────────────────────

    #[must_use]
    pub fn market_status(&self) -> &QueryStatus {
        self.market.status()
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.market.set_connected(connected);
    }

    /// Refetch the asset list if stale (or when `force` is set).
    pub async fn refresh_assets(&mut self, force: bool) -> Result<&[Asset], CoreError> {
        self.market.refresh_assets(force).await
    }

    /// Price history of one asset, quoted in the configured currency.
    pub async fn fetch_history(
        &self,
        asset_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<HistorySeries, CoreError> {
        self.market.fetch_history(asset_id, from, to).await
    }

    pub fn market(&self) -> &MarketService<P> {
        &self.market
    }

    pub fn market_mut(&mut self) -> &mut MarketService<P> {
        &mut self.market
    }

    pub fn store(&self) -> &SelectionStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SelectionStore<S> {
        &mut self.store
    }

    // ── Internal ────────────────────────────────────────────────────

    fn snapshot(&self) -> &[Asset] {
        self.market.assets().unwrap_or(&[])
    }
}
