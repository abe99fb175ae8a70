//! Persistent user configuration: automation days, the new-month template,
//! and the optional shared room.

pub mod manager;

pub use manager::ConfigManager;

use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::automation::AutomationSchedule;
use crate::domain::ModelTemplate;
use crate::sync::debounce::DEFAULT_DEBOUNCE_MS;
use crate::utils::paths;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub schedule: AutomationSchedule,
    #[serde(default)]
    pub template: ModelTemplate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    /// Custom directory for monthly records. Defaults to `<home>/store`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| paths::store_dir_in(base))
    }
}

/// Shared room the household writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    pub room_id: String,
    #[serde(default = "RemoteConfig::default_debounce_ms")]
    pub debounce_ms: u64,
}

impl RemoteConfig {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }

    pub fn default_debounce_ms() -> u64 {
        DEFAULT_DEBOUNCE_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_decodes_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.schedule.salary_day, 25);
        assert_eq!(config.template.groups.len(), 2);
    }

    #[test]
    fn remote_debounce_defaults_when_omitted() {
        let config: Config =
            serde_json::from_str(r#"{"remote": {"roomId": "family"}, "schedule": {"salaryDay": 10}}"#)
                .unwrap();
        assert_eq!(config.remote, Some(RemoteConfig::new("family")));
        assert_eq!(config.schedule.salary_day, 10);
        assert_eq!(config.schedule.allocation_day, 26);
    }

    #[test]
    fn data_dir_falls_back_to_store_dir() {
        let base = Path::new("/tmp/household");
        let mut config = Config::default();
        assert_eq!(config.resolve_data_dir(base), base.join("store"));
        config.data_dir = Some(PathBuf::from("/srv/budget"));
        assert_eq!(config.resolve_data_dir(base), PathBuf::from("/srv/budget"));
    }
}
