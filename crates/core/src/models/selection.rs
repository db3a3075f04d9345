use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

use super::loose;
use crate::errors::CoreError;

/// User-configured price thresholds attached to a holding.
///
/// Informational only: the core evaluates them but never pushes notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    #[serde(
        default,
        deserialize_with = "loose::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub above_price: Option<f64>,

    #[serde(
        default,
        deserialize_with = "loose::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub below_price: Option<f64>,
}

/// Which side of a [`PriceAlert`] the current price has crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertTrigger {
    Above(f64),
    Below(f64),
}

impl PriceAlert {
    pub fn new(above_price: Option<f64>, below_price: Option<f64>) -> Self {
        Self {
            above_price,
            below_price,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.above_price.is_none() && self.below_price.is_none()
    }

    /// Display text such as `"Above $70000 Below $60000"`.
    /// Zero thresholds are treated as unset.
    pub fn label(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(above) = self.above_price.filter(|p| *p != 0.0) {
            parts.push(format!("Above ${above}"));
        }
        if let Some(below) = self.below_price.filter(|p| *p != 0.0) {
            parts.push(format!("Below ${below}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Check `price` against the thresholds (inclusive). `above` wins if both match.
    pub fn evaluate(&self, price: f64) -> Option<AlertTrigger> {
        if let Some(above) = self.above_price {
            if price >= above {
                return Some(AlertTrigger::Above(above));
            }
        }
        if let Some(below) = self.below_price {
            if price <= below {
                return Some(AlertTrigger::Below(below));
            }
        }
        None
    }

    fn validate(&self) -> Result<(), CoreError> {
        for (side, value) in [("above", self.above_price), ("below", self.below_price)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(CoreError::ValidationError(format!(
                        "Alert {side} price must be a non-negative number, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One persisted holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedAsset {
    pub asset_id: String,

    #[serde(default, deserialize_with = "loose::number_or_zero")]
    pub quantity: f64,

    #[serde(
        default,
        rename = "priceAlert",
        skip_serializing_if = "Option::is_none"
    )]
    pub price_alert: Option<PriceAlert>,
}

impl SelectedAsset {
    pub fn new(asset_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            asset_id: asset_id.into(),
            quantity,
            price_alert: None,
        }
    }

    pub fn with_alert(mut self, alert: PriceAlert) -> Self {
        self.price_alert = Some(alert);
        self
    }
}

/// The user's holdings: the in-memory state object that mirrors the
/// persisted `userAssets` list.
///
/// Invariants:
/// - at most one entry per `asset_id`
/// - every entry has a positive, finite quantity (zero means "removed")
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Selection {
    entries: Vec<SelectedAsset>,
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<SelectedAsset>::deserialize(deserializer)?;
        Ok(Self::from_entries(entries))
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from raw entries, dropping anything that violates
    /// the invariants. The first entry wins when an id repeats.
    pub fn from_entries(entries: Vec<SelectedAsset>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries {
            if !(entry.quantity.is_finite() && entry.quantity > 0.0) {
                warn!(
                    "Dropping holding {} with quantity {}",
                    entry.asset_id, entry.quantity
                );
                continue;
            }
            if !seen.insert(entry.asset_id.clone()) {
                warn!("Dropping duplicate holding {}", entry.asset_id);
                continue;
            }
            kept.push(entry);
        }
        Self { entries: kept }
    }

    pub fn entries(&self) -> &[SelectedAsset] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, asset_id: &str) -> Option<&SelectedAsset> {
        self.entries.iter().find(|e| e.asset_id == asset_id)
    }

    pub fn contains(&self, asset_id: &str) -> bool {
        self.get(asset_id).is_some()
    }

    /// Held quantity, or 0 when the asset is not selected.
    pub fn quantity_of(&self, asset_id: &str) -> f64 {
        self.get(asset_id).map_or(0.0, |e| e.quantity)
    }

    /// Set the held quantity. Zero, negative or non-finite quantities remove
    /// the entry; otherwise an existing price alert is kept.
    pub fn set_quantity(&mut self, asset_id: &str, quantity: f64) {
        if !(quantity.is_finite() && quantity > 0.0) {
            if self.remove(asset_id) {
                debug!("Removed holding {asset_id}");
            }
            return;
        }
        match self.entries.iter_mut().find(|e| e.asset_id == asset_id) {
            Some(entry) => entry.quantity = quantity,
            None => self.entries.push(SelectedAsset::new(asset_id, quantity)),
        }
    }

    /// Text-field entry point: parse then [`Selection::set_quantity`].
    pub fn update_quantity(&mut self, asset_id: &str, text: &str) {
        self.set_quantity(asset_id, parse_quantity(text));
    }

    pub fn increment(&mut self, asset_id: &str) {
        let next = self.quantity_of(asset_id) + 1.0;
        self.set_quantity(asset_id, next);
    }

    pub fn decrement(&mut self, asset_id: &str) {
        if !self.contains(asset_id) {
            return;
        }
        let next = self.quantity_of(asset_id) - 1.0;
        self.set_quantity(asset_id, next);
    }

    /// Attach a price alert to a held asset. An empty alert clears it.
    pub fn set_price_alert(&mut self, asset_id: &str, alert: PriceAlert) -> Result<(), CoreError> {
        alert.validate()?;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.asset_id == asset_id)
            .ok_or_else(|| CoreError::AssetNotFound(format!("{asset_id} is not in the selection")))?;
        entry.price_alert = if alert.is_empty() { None } else { Some(alert) };
        Ok(())
    }

    /// Remove an entry. Returns `true` if it was present.
    pub fn remove(&mut self, asset_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.asset_id != asset_id);
        self.entries.len() != before
    }
}

/// Parse a quantity typed by the user.
///
/// Empty text is 0. Unparseable, negative or non-finite input is also 0,
/// with a warning, so it can never leak into totals as `NaN`.
pub fn parse_quantity(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(q) if q.is_finite() && q >= 0.0 => q,
        Ok(q) => {
            warn!("Quantity {q} is out of range, using 0");
            0.0
        }
        Err(_) => {
            warn!("Quantity '{trimmed}' is not a number, using 0");
            0.0
        }
    }
}

/// A held asset whose current price has crossed one of its alert thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredAlert {
    pub asset_id: String,
    pub price_usd: f64,
    pub trigger: AlertTrigger,
}
