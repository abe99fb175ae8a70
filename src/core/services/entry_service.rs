//! Manual ledger entry helpers.

use crate::domain::{coerce_amount, Entry, EntrySource, MonthlyModel};
use crate::errors::{BudgetError, Result};

/// Appends and removes entries by `(category id, index)`.
pub struct EntryService;

impl EntryService {
    /// Appends a manual entry and returns its index in the category's list.
    ///
    /// The entry is always stored as manual so the automation engine never
    /// mistakes it for its own output.
    pub fn add(model: &mut MonthlyModel, category_id: &str, mut entry: Entry) -> Result<usize> {
        if model.category(category_id).is_none() {
            return Err(BudgetError::CategoryNotFound(category_id.to_string()));
        }
        entry.amount = coerce_amount(entry.amount);
        if entry.amount <= 0.0 {
            return Err(BudgetError::InvalidInput(
                "entry amount must be greater than zero".into(),
            ));
        }
        entry.memo = entry.memo.trim().to_string();
        entry.source = EntrySource::Manual;
        let list = model.entries.entry(category_id.to_string()).or_default();
        list.push(entry);
        Ok(list.len() - 1)
    }

    /// Removes the entry at `index`, returning it.
    pub fn remove(model: &mut MonthlyModel, category_id: &str, index: usize) -> Result<Entry> {
        let not_found = || BudgetError::EntryNotFound {
            category_id: category_id.to_string(),
            index,
        };
        let list = model.entries.get_mut(category_id).ok_or_else(not_found)?;
        if index >= list.len() {
            return Err(not_found());
        }
        let removed = list.remove(index);
        if list.is_empty() {
            model.entries.remove(category_id);
        }
        Ok(removed)
    }

    pub fn list<'a>(model: &'a MonthlyModel, category_id: &str) -> &'a [Entry] {
        model.entries_for(category_id)
    }
}
