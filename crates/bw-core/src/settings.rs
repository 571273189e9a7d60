//! Process-wide flags kept alongside the blocklist records.

use crate::store::{MetadataStore, StoreError};

const RELOADING: &str = "isReloading";
const USE_CUSTOM_BLOCKLIST: &str = "isUseCustomBlocklistOn";
const BLOCK_SUBDOMAINS: &str = "isBlockSubdomainsOn";
const DOWNLOADED_LIST_TYPE: &str = "downloadedBlacklistType";

/// Typed access to the boolean and string settings in a [`MetadataStore`].
#[derive(Clone, Copy)]
pub struct Settings<'a> {
    store: &'a dyn MetadataStore,
}

impl<'a> Settings<'a> {
    pub fn new(store: &'a dyn MetadataStore) -> Self {
        Self { store }
    }

    /// True while an update run owns the rule artifacts.
    pub fn is_reloading(&self) -> Result<bool, StoreError> {
        self.get_bool(RELOADING)
    }

    pub fn set_reloading(&self, value: bool) -> Result<(), StoreError> {
        self.set_bool(RELOADING, value)
    }

    pub fn use_custom_blocklist(&self) -> Result<bool, StoreError> {
        self.get_bool(USE_CUSTOM_BLOCKLIST)
    }

    pub fn set_use_custom_blocklist(&self, value: bool) -> Result<(), StoreError> {
        self.set_bool(USE_CUSTOM_BLOCKLIST, value)
    }

    /// Whether the consumer should load the wildcard rule file.
    pub fn block_subdomains(&self) -> Result<bool, StoreError> {
        self.get_bool(BLOCK_SUBDOMAINS)
    }

    pub fn set_block_subdomains(&self, value: bool) -> Result<(), StoreError> {
        self.set_bool(BLOCK_SUBDOMAINS, value)
    }

    pub fn downloaded_list_type(&self) -> Result<String, StoreError> {
        Ok(self
            .store
            .get(DOWNLOADED_LIST_TYPE)?
            .unwrap_or_else(|| "none".to_string()))
    }

    pub fn set_downloaded_list_type(&self, value: &str) -> Result<(), StoreError> {
        self.store.set(DOWNLOADED_LIST_TYPE, value)
    }

    fn get_bool(&self, key: &str) -> Result<bool, StoreError> {
        match self.store.get(key)?.as_deref() {
            None => Ok(false),
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            Some(other) => Err(StoreError::InvalidValue {
                key: key.to_string(),
                value: other.to_string(),
            }),
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.store.set(key, if value { "true" } else { "false" })
    }
}
