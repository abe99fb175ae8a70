//! Export and import of every persisted record as a single JSON bundle.

use std::{fs, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::domain::MonthKey;
use crate::errors::{BudgetError, Result};
use crate::utils::atomic::replace_file;

use super::{validate_key, KeyValueStore, REMOTE_CONFIG_KEY, ROOM_ID_KEY};

pub const BACKUP_TYPE_TAG: &str = "budget-backup";
pub const BACKUP_VERSION: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupBundle {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    pub items: Vec<BackupItem>,
}

/// One persisted record, value kept as the raw stored string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupItem {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreSummary {
    pub total: usize,
    pub overwritten: usize,
    pub skipped: usize,
}

impl BackupBundle {
    pub fn new(items: Vec<BackupItem>, exported_at: DateTime<Utc>) -> Self {
        Self {
            kind: BACKUP_TYPE_TAG.to_string(),
            version: BACKUP_VERSION,
            exported_at: Some(exported_at),
            items,
        }
    }

    /// Checks the tag, version, and keys without touching any store.
    pub fn validate(&self) -> Result<()> {
        if self.kind != BACKUP_TYPE_TAG {
            return Err(BudgetError::InvalidBackup(format!(
                "unexpected type tag `{}`",
                self.kind
            )));
        }
        if self.version == 0 || self.version > BACKUP_VERSION {
            return Err(BudgetError::InvalidBackup(format!(
                "unsupported version {}",
                self.version
            )));
        }
        for item in &self.items {
            validate_key(&item.key)
                .map_err(|_| BudgetError::InvalidBackup(format!("invalid key `{}`", item.key)))?;
        }
        Ok(())
    }

    pub fn file_name(&self) -> String {
        let stamp = self
            .exported_at
            .unwrap_or_else(Utc::now)
            .format("%Y-%m-%dT%H-%M-%SZ");
        format!("{BACKUP_TYPE_TAG}-{stamp}.json")
    }
}

fn is_backed_up_key(key: &str) -> bool {
    MonthKey::from_storage_key(key).is_some() || key == REMOTE_CONFIG_KEY || key == ROOM_ID_KEY
}

/// Collects every monthly record and connection setting from `store`.
pub fn export_bundle<S: KeyValueStore + ?Sized>(
    store: &S,
    exported_at: DateTime<Utc>,
) -> Result<BackupBundle> {
    let mut items = Vec::new();
    for key in store.keys()? {
        if !is_backed_up_key(&key) {
            continue;
        }
        if let Some(value) = store.get(&key)? {
            items.push(BackupItem { key, value });
        }
    }
    info!(items = items.len(), "backup bundle exported");
    Ok(BackupBundle::new(items, exported_at))
}

/// Parses bundle text, rejecting anything that is not a well-formed bundle.
pub fn parse_bundle(text: &str) -> Result<BackupBundle> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| BudgetError::InvalidBackup(format!("not valid JSON: {err}")))?;
    let tag = value.get("type").and_then(Value::as_str);
    if tag != Some(BACKUP_TYPE_TAG) {
        return Err(BudgetError::InvalidBackup(
            "missing `budget-backup` type tag".into(),
        ));
    }
    if !value.get("items").map(Value::is_array).unwrap_or(false) {
        return Err(BudgetError::InvalidBackup("`items` must be an array".into()));
    }
    let bundle: BackupBundle = serde_json::from_value(value)
        .map_err(|err| BudgetError::InvalidBackup(err.to_string()))?;
    bundle.validate()?;
    Ok(bundle)
}

/// Writes every item into `store`. `confirm` is asked before replacing an
/// existing key; declining skips that item. Nothing is written when the
/// bundle fails validation.
pub fn restore_bundle<S, F>(store: &S, bundle: &BackupBundle, mut confirm: F) -> Result<RestoreSummary>
where
    S: KeyValueStore + ?Sized,
    F: FnMut(&str) -> bool,
{
    bundle.validate()?;
    let mut summary = RestoreSummary {
        total: bundle.items.len(),
        ..RestoreSummary::default()
    };
    for item in &bundle.items {
        let exists = store.contains(&item.key)?;
        if exists && !confirm(&item.key) {
            summary.skipped += 1;
            continue;
        }
        store.set(&item.key, &item.value)?;
        if exists {
            summary.overwritten += 1;
        }
    }
    info!(
        total = summary.total,
        overwritten = summary.overwritten,
        skipped = summary.skipped,
        "backup bundle restored"
    );
    Ok(summary)
}

pub fn write_bundle_to_path(bundle: &BackupBundle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(bundle)?;
    replace_file(path, &json)?;
    Ok(())
}

pub fn read_bundle_from_path(path: &Path) -> Result<BackupBundle> {
    let text = fs::read_to_string(path)?;
    parse_bundle(&text)
}
