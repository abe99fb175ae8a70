use chrono::NaiveDate;

use crate::domain::{coerce_amount, Entry, EntryKind, MonthlyModel};
use crate::errors::{BudgetError, Result};

/// Pool versus allocations for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub group_id: String,
    pub pool: f64,
    pub allocated: f64,
    /// `pool - allocated`; what stays in the main category after the sweep.
    pub unallocated: f64,
    pub sub_category_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CategoryBalance {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

/// An entry together with where it lives in the model.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedEntry {
    pub category_id: String,
    pub index: usize,
    pub entry: Entry,
}

pub struct SummaryService;

impl SummaryService {
    pub fn group_summary(model: &MonthlyModel, group_id: &str) -> Result<GroupSummary> {
        let group = model
            .group(group_id)
            .ok_or_else(|| BudgetError::GroupNotFound(group_id.to_string()))?;
        let pool = coerce_amount(group.pool);
        let mut allocated = 0.0;
        let mut sub_category_count = 0;
        for category in model.sub_categories(group_id) {
            sub_category_count += 1;
            allocated += coerce_amount(category.amount).max(0.0);
        }
        Ok(GroupSummary {
            group_id: group_id.to_string(),
            pool,
            allocated,
            unallocated: pool - allocated,
            sub_category_count,
        })
    }

    pub fn category_balance(model: &MonthlyModel, category_id: &str) -> CategoryBalance {
        model
            .entries_for(category_id)
            .iter()
            .fold(CategoryBalance::default(), |mut balance, entry| {
                match entry.kind {
                    EntryKind::Income => balance.income += entry.amount,
                    EntryKind::Expense => balance.expense += entry.amount,
                }
                balance.net += entry.signed_amount();
                balance
            })
    }

    /// Every entry dated `date`, ordered by category id then position.
    pub fn entries_on(model: &MonthlyModel, date: NaiveDate) -> Vec<DatedEntry> {
        model
            .entries_on(date)
            .map(|(category_id, index, entry)| DatedEntry {
                category_id: category_id.to_string(),
                index,
                entry: entry.clone(),
            })
            .collect()
    }

    /// The `limit` most recent entries, newest date first.
    pub fn recent_entries(model: &MonthlyModel, limit: usize) -> Vec<DatedEntry> {
        let mut rows: Vec<DatedEntry> = model
            .all_entries()
            .map(|(category_id, index, entry)| DatedEntry {
                category_id: category_id.to_string(),
                index,
                entry: entry.clone(),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.entry
                .date
                .cmp(&a.entry.date)
                .then_with(|| a.category_id.cmp(&b.category_id))
                .then_with(|| b.index.cmp(&a.index))
        });
        rows.truncate(limit);
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelTemplate, MonthKey};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, day).unwrap()
    }

    fn model() -> MonthlyModel {
        let mut model =
            MonthlyModel::initial(MonthKey::parse("2025-08").unwrap(), &ModelTemplate::default());
        model.group_mut("salary").unwrap().pool = 3_000_000.0;
        model.category_mut("living").unwrap().amount = 500_000.0;
        model.category_mut("food").unwrap().amount = 300_000.0;
        model.category_mut("phone").unwrap().amount = -100.0;
        model
    }

    #[test]
    fn group_summary_reports_unallocated_remainder() {
        let summary = SummaryService::group_summary(&model(), "salary").unwrap();
        assert_eq!(summary.allocated, 800_000.0);
        assert_eq!(summary.unallocated, 2_200_000.0);
        assert_eq!(summary.sub_category_count, 5);
    }

    #[test]
    fn balances_and_day_queries() {
        let mut model = model();
        let list = model.entries.entry("living".into()).or_default();
        list.push(Entry::manual(date(3), 100.0, EntryKind::Income, "refund"));
        list.push(Entry::manual(date(9), 40.0, EntryKind::Expense, "market"));

        let balance = SummaryService::category_balance(&model, "living");
        assert_eq!(balance.income, 100.0);
        assert_eq!(balance.expense, 40.0);
        assert_eq!(balance.net, 60.0);

        let on_ninth = SummaryService::entries_on(&model, date(9));
        assert_eq!(on_ninth.len(), 1);
        assert_eq!(on_ninth[0].index, 1);

        let recent = SummaryService::recent_entries(&model, 1);
        assert_eq!(recent[0].entry.memo, "market");
    }
}
