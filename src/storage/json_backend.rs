use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::errors::Result;
use crate::utils::atomic::replace_file;

use super::{validate_key, KeyValueStore};

const RECORD_EXTENSION: &str = "json";

/// Filesystem-backed store keeping one JSON file per key.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{RECORD_EXTENSION}"))
    }
}

impl KeyValueStore for JsonDirStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        match fs::read_to_string(self.record_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        replace_file(&self.record_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        match fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::atomic::tmp_path;
    use tempfile::TempDir;

    fn store() -> (JsonDirStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store = JsonDirStore::new(temp.path().join("store")).expect("json store");
        (store, temp)
    }

    #[test]
    fn set_get_and_list_keys() {
        let (store, _guard) = store();
        store.set("budget-2025-08", r#"{"month":"2025-08"}"#).unwrap();
        store.set("budget-room", "family").unwrap();
        assert_eq!(
            store.get("budget-2025-08").unwrap().as_deref(),
            Some(r#"{"month":"2025-08"}"#)
        );
        assert_eq!(store.keys().unwrap(), vec!["budget-2025-08", "budget-room"]);
        assert!(store.record_path("budget-room").exists());
    }

    #[test]
    fn missing_keys_read_as_none_and_remove_is_idempotent() {
        let (store, _guard) = store();
        assert_eq!(store.get("budget-2030-01").unwrap(), None);
        store.remove("budget-2030-01").unwrap();
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let (store, _guard) = store();
        store.set("budget-2025-08", "first").unwrap();
        let blocker = tmp_path(&store.record_path("budget-2025-08"));
        fs::create_dir_all(&blocker).unwrap();

        assert!(store.set("budget-2025-08", "second").is_err());
        assert_eq!(store.get("budget-2025-08").unwrap().as_deref(), Some("first"));
        assert_eq!(store.keys().unwrap(), vec!["budget-2025-08"]);
    }
}
