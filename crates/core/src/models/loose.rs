//! Deserialisation helpers for numeric fields that may arrive as a JSON
//! number, a numeric string, `null`, or not at all.
//!
//! Everything crossing this boundary is either a finite `f64` or absent.

use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a loosely-typed JSON value as a finite number.
pub(crate) fn to_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Some(n),
        _ => {
            warn!("Ignoring non-numeric value {value}");
            None
        }
    }
}

/// `deserialize_with` target for `Option<f64>` fields.
pub(crate) fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(to_number))
}

/// `deserialize_with` target for `f64` fields that default to zero.
pub(crate) fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_number(deserializer)?.unwrap_or(0.0))
}
