//! Key-value persistence for monthly models, plus backup bundles.

pub mod backup;
pub mod json_backend;
pub mod repository;

use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use crate::errors::{BudgetError, Result};

pub use backup::{
    export_bundle, parse_bundle, read_bundle_from_path, restore_bundle, write_bundle_to_path,
    BackupBundle, BackupItem, RestoreSummary, BACKUP_TYPE_TAG, BACKUP_VERSION,
};
pub use json_backend::JsonDirStore;
pub use repository::{LoadReport, ModelRepository};

/// Key under which the remote connection settings are persisted.
pub const REMOTE_CONFIG_KEY: &str = "budget-remote-config";
/// Key under which the shared room id is persisted.
pub const ROOM_ID_KEY: &str = "budget-room";

/// String blobs addressed by string keys, the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// All stored keys in ascending order.
    fn keys(&self) -> Result<Vec<String>>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Keys are limited to characters that survive as file names unchanged.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(BudgetError::InvalidInput(format!("invalid storage key `{key}`")))
    }
}

/// In-process store used by tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.keys().cloned().collect())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}
