use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::core::main_accounts::ensure_main_categories_in_place;
use crate::domain::{Entry, EntrySource, ModelTemplate, MonthKey, MonthlyModel};
use crate::errors::Result;

use super::KeyValueStore;

/// Outcome of loading one month.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub model: MonthlyModel,
    /// True when nothing usable was stored and the model came from the template.
    pub created: bool,
    pub warnings: Vec<String>,
    pub migrations: Vec<String>,
}

/// Reads and writes monthly models through a [`KeyValueStore`].
pub struct ModelRepository<S: KeyValueStore> {
    store: S,
    template: ModelTemplate,
}

impl<S: KeyValueStore> ModelRepository<S> {
    pub fn new(store: S, template: ModelTemplate) -> Self {
        Self { store, template }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn template(&self) -> &ModelTemplate {
        &self.template
    }

    /// Loads `month`, falling back to a fresh model when the record is absent or unreadable.
    pub fn load(&self, month: MonthKey) -> Result<LoadReport> {
        let key = month.storage_key();
        let mut warnings = Vec::new();
        let parsed = match self.store.get(&key)? {
            None => None,
            Some(raw) => match decode_month(&raw) {
                Ok((model, rejected)) => {
                    if !rejected.is_empty() {
                        warnings.extend(self.quarantine(&key, rejected)?);
                    }
                    Some(model)
                }
                Err(err) => {
                    warn!(%month, error = %err, "stored month is malformed, starting fresh");
                    warnings.push(format!("record `{key}` could not be parsed: {err}"));
                    None
                }
            },
        };

        let created = parsed.is_none();
        let mut model = parsed.unwrap_or_else(|| MonthlyModel::initial(month, &self.template));
        if model.month != month {
            warnings.push(format!(
                "record `{key}` was labelled {}, relabelled to {month}",
                model.month
            ));
            model.month = month;
        }

        let mut migrations = migrate_legacy_tags(&mut model);
        let restored = ensure_main_categories_in_place(&mut model);
        if restored > 0 {
            migrations.push(format!("restored {restored} missing main categories"));
        }
        Ok(LoadReport {
            model,
            created,
            warnings,
            migrations,
        })
    }

    /// Keeps undecodable entries under `<key>.rejected` so they survive the next save.
    fn quarantine(&self, key: &str, rejected: Vec<RejectedEntry>) -> Result<Vec<String>> {
        let quarantine_key = format!("{key}{REJECTED_SUFFIX}");
        let mut kept = self
            .store
            .get(&quarantine_key)?
            .and_then(|raw| serde_json::from_str::<Map<String, Value>>(&raw).ok())
            .unwrap_or_default();
        let mut notes = Vec::with_capacity(rejected.len());
        for entry in rejected {
            warn!(key, category = %entry.category_id, error = %entry.reason, "entry dropped on load");
            notes.push(format!(
                "entry {} of category {} in `{key}` was unreadable ({}) and moved to `{quarantine_key}`",
                entry.index, entry.category_id, entry.reason
            ));
            match kept
                .entry(entry.category_id)
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                Value::Array(items) => items.push(entry.raw),
                other => *other = Value::Array(vec![entry.raw]),
            }
        }
        self.store
            .set(&quarantine_key, &serde_json::to_string_pretty(&kept)?)?;
        Ok(notes)
    }

    pub fn save(&self, model: &MonthlyModel) -> Result<()> {
        let json = serde_json::to_string_pretty(model)?;
        self.store.set(&model.month.storage_key(), &json)?;
        info!(month = %model.month, entries = model.entry_count(), "month saved");
        Ok(())
    }

    pub fn remove(&self, month: MonthKey) -> Result<()> {
        self.store.remove(&month.storage_key())
    }

    /// Months that have a persisted record, oldest first.
    pub fn months(&self) -> Result<Vec<MonthKey>> {
        let mut months: Vec<MonthKey> = self
            .store
            .keys()?
            .iter()
            .filter_map(|key| MonthKey::from_storage_key(key))
            .collect();
        months.sort();
        Ok(months)
    }
}

/// Suffix of the key holding entries that could not be decoded.
pub const REJECTED_SUFFIX: &str = ".rejected";

#[derive(Debug)]
struct RejectedEntry {
    category_id: String,
    index: usize,
    raw: Value,
    reason: String,
}

/// Decodes a stored month, entry by entry.
///
/// Only invalid JSON or a broken month shape fails the record. An entry that
/// does not decode is set aside and reported instead of discarding the month.
fn decode_month(raw: &str) -> serde_json::Result<(MonthlyModel, Vec<RejectedEntry>)> {
    let mut value: Value = serde_json::from_str(raw)?;
    let entries = value
        .as_object_mut()
        .and_then(|object| object.remove("entries"));
    let mut model: MonthlyModel = serde_json::from_value(value)?;

    let mut rejected = Vec::new();
    let Some(Value::Object(lists)) = entries else {
        return Ok((model, rejected));
    };
    for (category_id, list) in lists {
        let items = match list {
            Value::Array(items) => items,
            other => {
                rejected.push(RejectedEntry {
                    category_id,
                    index: 0,
                    raw: other,
                    reason: "entry list is not an array".into(),
                });
                continue;
            }
        };
        let mut decoded = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<Entry>(item.clone()) {
                Ok(entry) => decoded.push(entry),
                Err(err) => rejected.push(RejectedEntry {
                    category_id: category_id.clone(),
                    index,
                    raw: item,
                    reason: err.to_string(),
                }),
            }
        }
        if !decoded.is_empty() {
            model.entries.insert(category_id, decoded);
        }
    }
    Ok((model, rejected))
}

/// Converts entries tagged with the old memo grammar into structured markers.
pub fn migrate_legacy_tags(model: &mut MonthlyModel) -> Vec<String> {
    let mut notes = Vec::new();
    for (category_id, list) in model.entries.iter_mut() {
        for entry in list.iter_mut().filter(|entry| entry.source.is_manual()) {
            if let Some(source) = EntrySource::from_legacy_memo(&entry.memo) {
                notes.push(format!(
                    "converted legacy tag `{}` in category {category_id}",
                    entry.memo
                ));
                entry.source = source;
            }
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn repo() -> ModelRepository<MemoryStore> {
        ModelRepository::new(MemoryStore::new(), ModelTemplate::default())
    }

    fn august() -> MonthKey {
        MonthKey::parse("2025-08").unwrap()
    }

    #[test]
    fn missing_month_is_created_from_template() {
        let report = repo().load(august()).unwrap();
        assert!(report.created);
        assert_eq!(report.model.groups.len(), 2);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn malformed_month_falls_back_with_warning() {
        let repo = repo();
        repo.store().set("budget-2025-08", "{not json").unwrap();
        let report = repo.load(august()).unwrap();
        assert!(report.created);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.model.month, august());
    }

    #[test]
    fn unreadable_entry_is_set_aside_without_losing_the_month() {
        let repo = repo();
        let raw = r#"{
            "month": "2025-08",
            "groups": [{"id": "g2", "name": "여행", "type": "generic", "pool": 0}],
            "categories": [{"id": "trip", "name": "항공권", "groupId": "g2", "amount": 0}],
            "entries": {"trip": [
                {"date": "2025-08-04", "amount": 120000, "type": "expense", "memo": "flight"},
                {"date": "", "amount": 5000, "type": "expense", "memo": "no date"},
                {"date": "2025-08-09", "amount": 3000, "memo": "no type"},
                {"date": "2025-08-10", "amount": 2000, "type": "income", "memo": "refund"}
            ]}
        }"#;
        repo.store().set("budget-2025-08", raw).unwrap();

        let report = repo.load(august()).unwrap();
        assert!(!report.created);
        assert!(report.model.group("g2").is_some());
        let memos: Vec<&str> = report
            .model
            .entries_for("trip")
            .iter()
            .map(|entry| entry.memo.as_str())
            .collect();
        assert_eq!(memos, vec!["flight", "refund"]);
        assert_eq!(report.warnings.len(), 2);

        let kept: Value = serde_json::from_str(
            &repo.store().get("budget-2025-08.rejected").unwrap().unwrap(),
        )
        .unwrap();
        assert_eq!(kept["trip"].as_array().unwrap().len(), 2);
        assert_eq!(kept["trip"][0]["memo"], "no date");
        assert_eq!(repo.months().unwrap(), vec![august()]);
    }

    #[test]
    fn save_then_load_keeps_model() {
        let repo = repo();
        let mut model = MonthlyModel::initial(august(), repo.template());
        model.group_mut("salary").unwrap().pool = 10.0;
        repo.save(&model).unwrap();
        let report = repo.load(august()).unwrap();
        assert!(!report.created);
        assert_eq!(report.model, model);
        assert_eq!(repo.months().unwrap(), vec![august()]);
    }

    #[test]
    fn load_converts_legacy_memos_and_restores_mains() {
        let repo = repo();
        let raw = r#"{
            "month": "2025-08",
            "groups": [{"id": "salary", "name": "월급통장", "type": "salary", "pool": 100}],
            "categories": [],
            "entries": {"main_salary": [
                {"date": "2025-08-25", "amount": 100, "type": "income", "memo": "SALARY:salary:2025-08"},
                {"date": "2025-08-02", "amount": 5, "type": "expense", "memo": "coffee"}
            ]}
        }"#;
        repo.store().set("budget-2025-08", raw).unwrap();
        let report = repo.load(august()).unwrap();
        let entries = report.model.entries_for("main_salary");
        assert!(matches!(entries[0].source, EntrySource::AutoSalary { .. }));
        assert!(entries[1].source.is_manual());
        assert_eq!(report.migrations.len(), 2);
        assert!(report.model.main_category("salary").is_some());
    }
}
