//! Persistence of the credential lists.
//!
//! Each list lives in its own storage slot as a JSON array. Stored data is
//! never trusted: a missing slot, an unreadable slot and a slot whose JSON
//! does not match the current record shape all load as an empty list.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::credentials::{ParseCredential, TranslateCredential};
use crate::error::{Error, Result};
use crate::storage::Storage;

/// Storage key holding the parse API credentials
pub const PARSE_APIS_KEY: &str = "parseAPIs";
/// Storage key holding the translate API credentials
pub const TRANSLATE_APIS_KEY: &str = "translateAPIs";

/// Reads and writes both credential lists
#[derive(Clone)]
pub struct ConfigStore {
    storage: Arc<dyn Storage>,
}

impl ConfigStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Load both lists. Never fails; see the module docs for the fallbacks.
    pub fn load(&self) -> (Vec<ParseCredential>, Vec<TranslateCredential>) {
        (
            self.load_list(PARSE_APIS_KEY),
            self.load_list(TRANSLATE_APIS_KEY),
        )
    }

    /// Overwrite both slots with the given lists
    pub fn save(&self, parse: &[ParseCredential], translate: &[TranslateCredential]) -> Result<()> {
        self.save_list(PARSE_APIS_KEY, parse)?;
        self.save_list(TRANSLATE_APIS_KEY, translate)?;
        debug!(
            "Saved {} parse and {} translate credentials",
            parse.len(),
            translate.len()
        );
        Ok(())
    }

    fn load_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read '{}': {}", key, e);
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring malformed '{}' slot: {}", key, e);
            Vec::new()
        })
    }

    fn save_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let json = serde_json::to_string(items).map_err(|e| Error::Serialize(e.to_string()))?;
        self.storage.set(key, &json)
    }
}
