#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::NaiveDate;
use household_budget::{
    core::{AutomationSchedule, BudgetSession},
    domain::{ModelTemplate, MonthKey},
    storage::{JsonDirStore, ModelRepository},
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn month(raw: &str) -> MonthKey {
    MonthKey::parse(raw).expect("valid month")
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn json_store(base: &PathBuf) -> JsonDirStore {
    JsonDirStore::new(base.join("store")).expect("create json store")
}

/// Opens a session for `raw_month` on an isolated on-disk store.
pub fn setup_session(raw_month: &str) -> (BudgetSession<JsonDirStore>, PathBuf) {
    let base = temp_base();
    let repository = ModelRepository::new(json_store(&base), ModelTemplate::default());
    let session = BudgetSession::open(repository, AutomationSchedule::default(), month(raw_month))
        .expect("open session");
    (session, base)
}
