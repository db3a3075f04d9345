use std::collections::HashMap;

use crate::models::asset::{Asset, EnrichedAsset, ListedAsset};
use crate::models::selection::{Selection, TriggeredAlert};

/// Joins a market snapshot with the user's selection.
///
/// Pure business logic: no I/O, no state, the same inputs always give the
/// same outputs.
pub struct AssetAggregator;

impl AssetAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Held assets only, in snapshot order, each with its quantity and a
    /// per-row `total` of `volume_1hrs_usd * quantity`.
    ///
    /// Holdings whose asset is missing from the snapshot are skipped.
    pub fn filtered_holdings(&self, assets: &[Asset], selection: &Selection) -> Vec<EnrichedAsset> {
        let quantities = Self::quantity_index(selection);
        assets
            .iter()
            .filter_map(|asset| {
                let quantity = quantities.get(asset.asset_id.as_str()).copied()?;
                if quantity <= 0.0 {
                    return None;
                }
                Some(EnrichedAsset {
                    asset: asset.clone(),
                    quantity,
                    total: asset.volume_1hrs_usd * quantity,
                })
            })
            .collect()
    }

    /// Net worth of the selection: `Σ price_usd * quantity` over the snapshot.
    ///
    /// Missing prices and unselected assets contribute 0.
    pub fn total_portfolio_value(&self, assets: &[Asset], selection: &Selection) -> f64 {
        let quantities = Self::quantity_index(selection);
        assets
            .iter()
            .map(|asset| {
                let quantity = quantities.get(asset.asset_id.as_str()).copied().unwrap_or(0.0);
                asset.price_or_zero() * quantity
            })
            .sum()
    }

    /// The selectable universe: every asset except those with exactly zero
    /// daily volume, in snapshot order.
    pub fn assets_with_non_zero_volume(&self, assets: &[Asset]) -> Vec<ListedAsset> {
        assets
            .iter()
            .filter(|asset| asset.volume_1day_usd != 0.0)
            .map(ListedAsset::from)
            .collect()
    }

    /// Held assets whose current price crossed their alert thresholds.
    /// Assets without a price are never reported.
    pub fn triggered_alerts(&self, assets: &[Asset], selection: &Selection) -> Vec<TriggeredAlert> {
        assets
            .iter()
            .filter_map(|asset| {
                let alert = selection.get(&asset.asset_id)?.price_alert.as_ref()?;
                let price = asset.price_usd?;
                let trigger = alert.evaluate(price)?;
                Some(TriggeredAlert {
                    asset_id: asset.asset_id.clone(),
                    price_usd: price,
                    trigger,
                })
            })
            .collect()
    }

    fn quantity_index(selection: &Selection) -> HashMap<&str, f64> {
        selection
            .entries()
            .iter()
            .map(|e| (e.asset_id.as_str(), e.quantity))
            .collect()
    }
}

impl Default for AssetAggregator {
    fn default() -> Self {
        Self::new()
    }
}
