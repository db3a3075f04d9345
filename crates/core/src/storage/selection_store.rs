use log::{debug, error};

use crate::errors::CoreError;
use crate::models::selection::Selection;

use super::kv::KeyValueStore;

/// Storage key holding the user's selection document.
pub const USER_ASSETS_KEY: &str = "userAssets";

/// Persists the whole [`Selection`] as one JSON array under [`USER_ASSETS_KEY`].
///
/// Every save overwrites the previous document: no merging, no versioning and
/// no locking. Callers are expected to issue saves from one logical sequence;
/// concurrent writers race and the last one wins.
pub struct SelectionStore<S> {
    backend: S,
}

impl<S: KeyValueStore> SelectionStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    pub fn into_inner(self) -> S {
        self.backend
    }

    /// Read the stored selection. `Ok(None)` means nothing was ever saved.
    pub fn try_load(&self) -> Result<Option<Selection>, CoreError> {
        match self.backend.get(USER_ASSETS_KEY)? {
            Some(raw) => decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// Read the stored selection, treating a missing or unreadable document
    /// as an empty selection. Failures are logged, never propagated.
    pub fn load(&self) -> Selection {
        match self.try_load() {
            Ok(Some(selection)) => {
                debug!("Loaded {} holdings", selection.len());
                selection
            }
            Ok(None) => Selection::new(),
            Err(e) => {
                error!("Failed to load stored holdings, starting empty: {e}");
                Selection::new()
            }
        }
    }

    /// Serialize and write the full selection, replacing any prior value.
    pub fn save(&mut self, selection: &Selection) -> Result<(), CoreError> {
        let raw = encode(selection)?;
        self.backend.set(USER_ASSETS_KEY, &raw)?;
        debug!("Saved {} holdings", selection.len());
        Ok(())
    }

    /// Delete the stored document. Returns `true` if one existed.
    pub fn clear(&mut self) -> Result<bool, CoreError> {
        self.backend.remove(USER_ASSETS_KEY)
    }
}

/// JSON document for a selection: `[{"asset_id": "BTC", "quantity": 2, ...}]`.
pub fn encode(selection: &Selection) -> Result<String, CoreError> {
    serde_json::to_string(selection)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize holdings: {e}")))
}

/// Parse a stored document. `null` decodes as an empty selection; entries that
/// break the selection invariants are dropped.
pub fn decode(raw: &str) -> Result<Selection, CoreError> {
    let parsed: Option<Selection> = serde_json::from_str(raw)
        .map_err(|e| CoreError::Deserialization(format!("Failed to parse stored holdings: {e}")))?;
    Ok(parsed.unwrap_or_default())
}
