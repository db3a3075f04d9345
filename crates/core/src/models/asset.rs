use serde::{Deserialize, Serialize};

use super::loose;

/// A tradable asset as reported by the market-data API.
///
/// Immutable snapshot, fetched per query and never persisted.
/// Numeric fields go through the loose-number boundary on deserialisation:
/// an unusable price becomes `None`, an unusable volume becomes `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Exchange symbol, unique within a snapshot (e.g., "BTC").
    pub asset_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(
        default,
        deserialize_with = "loose::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub price_usd: Option<f64>,

    #[serde(default, deserialize_with = "loose::number_or_zero")]
    pub volume_1hrs_usd: f64,

    #[serde(default, deserialize_with = "loose::number_or_zero")]
    pub volume_1day_usd: f64,
}

impl Asset {
    pub fn new(asset_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            name: name.into(),
            price_usd: None,
            volume_1hrs_usd: 0.0,
            volume_1day_usd: 0.0,
        }
    }

    pub fn with_price(mut self, price_usd: f64) -> Self {
        self.price_usd = Some(price_usd);
        self
    }

    pub fn with_volumes(mut self, volume_1hrs_usd: f64, volume_1day_usd: f64) -> Self {
        self.volume_1hrs_usd = volume_1hrs_usd;
        self.volume_1day_usd = volume_1day_usd;
        self
    }

    /// Price with the "absent counts as zero" policy used for valuations.
    pub fn price_or_zero(&self) -> f64 {
        self.price_usd.unwrap_or(0.0)
    }
}

/// The three-field projection of an [`Asset`] offered to the user when
/// picking holdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedAsset {
    pub asset_id: String,
    pub name: String,
    pub price_usd: Option<f64>,
}

impl From<&Asset> for ListedAsset {
    fn from(asset: &Asset) -> Self {
        Self {
            asset_id: asset.asset_id.clone(),
            name: asset.name.clone(),
            price_usd: asset.price_usd,
        }
    }
}

/// An asset joined with the user's held quantity.
///
/// Derived on every computation and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedAsset {
    #[serde(flatten)]
    pub asset: Asset,

    pub quantity: f64,

    /// Per-row total: hourly USD volume × quantity.
    pub total: f64,
}
