use dirs::home_dir;
use std::{env, path::PathBuf};

const DEFAULT_DIR_NAME: &str = ".household_budget";
const HOME_ENV: &str = "HOUSEHOLD_BUDGET_HOME";
const STORE_DIR: &str = "store";
const BACKUP_DIR: &str = "backups";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";

/// Application data directory, `~/.household_budget` unless `HOUSEHOLD_BUDGET_HOME` is set.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding one JSON file per persisted key.
pub fn store_dir_in(base: &std::path::Path) -> PathBuf {
    base.join(STORE_DIR)
}

pub fn backup_dir_in(base: &std::path::Path) -> PathBuf {
    base.join(BACKUP_DIR)
}

pub fn config_dir_in(base: &std::path::Path) -> PathBuf {
    base.join(CONFIG_DIR)
}

pub fn config_file_in(base: &std::path::Path) -> PathBuf {
    config_dir_in(base).join(CONFIG_FILE)
}

pub fn config_backup_dir_in(base: &std::path::Path) -> PathBuf {
    config_dir_in(base).join(BACKUP_DIR)
}
