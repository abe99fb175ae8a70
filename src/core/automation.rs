//! Monthly automation: salary credit followed by the allocation sweep.
//!
//! The engine is a pure transform. Every run first purges what a previous run
//! generated for the month and then regenerates it, so applying it any number of
//! times yields the same entries as applying it once. Manual entries are never
//! touched because only entries carrying an automation [`EntrySource`] are purged.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    coerce_amount, main_category_id, Entry, EntryKind, EntrySource, MonthKey, MonthlyModel,
};

use super::main_accounts::ensure_main_categories;

pub const DEFAULT_SALARY_DAY: u32 = 25;
pub const DEFAULT_ALLOCATION_DAY: u32 = 26;

/// Days of the month on which automated entries are dated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationSchedule {
    #[serde(default = "AutomationSchedule::default_salary_day")]
    pub salary_day: u32,
    #[serde(default = "AutomationSchedule::default_allocation_day")]
    pub allocation_day: u32,
}

impl AutomationSchedule {
    pub fn default_salary_day() -> u32 {
        DEFAULT_SALARY_DAY
    }

    pub fn default_allocation_day() -> u32 {
        DEFAULT_ALLOCATION_DAY
    }
}

impl Default for AutomationSchedule {
    fn default() -> Self {
        Self {
            salary_day: DEFAULT_SALARY_DAY,
            allocation_day: DEFAULT_ALLOCATION_DAY,
        }
    }
}

/// Counts describing what a single engine run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutomationOutcome {
    pub purged: usize,
    pub salary_entries: usize,
    pub allocation_pairs: usize,
}

/// Recomputes the automated entries of `month` using the default schedule.
pub fn apply_automations(model: MonthlyModel, month: MonthKey) -> MonthlyModel {
    apply_automations_with(model, month, &AutomationSchedule::default())
}

/// Recomputes the automated entries of `month` using `schedule`.
pub fn apply_automations_with(
    model: MonthlyModel,
    month: MonthKey,
    schedule: &AutomationSchedule,
) -> MonthlyModel {
    let mut model = ensure_main_categories(model);
    let outcome = run_phases(&mut model, month, schedule);
    debug!(
        %month,
        purged = outcome.purged,
        salary = outcome.salary_entries,
        allocations = outcome.allocation_pairs,
        "automations applied"
    );
    model
}

fn run_phases(
    model: &mut MonthlyModel,
    month: MonthKey,
    schedule: &AutomationSchedule,
) -> AutomationOutcome {
    AutomationOutcome {
        purged: purge_generated(model, month),
        salary_entries: credit_salaries(model, month, schedule.salary_day),
        allocation_pairs: sweep_allocations(model, month, schedule.allocation_day),
    }
}

/// Whether `entry` is output of a previous run for `month`.
///
/// Salary credits are matched by the month in their marker; allocation
/// entries by their date falling inside the month.
pub fn is_generated_for(entry: &Entry, month: MonthKey) -> bool {
    match &entry.source {
        EntrySource::Manual => false,
        EntrySource::AutoSalary { month: tagged, .. } => *tagged == month,
        EntrySource::AutoAllocation { .. } => month.contains(entry.date),
    }
}

fn purge_generated(model: &mut MonthlyModel, month: MonthKey) -> usize {
    let mut purged = 0;
    for list in model.entries.values_mut() {
        let before = list.len();
        list.retain(|entry| !is_generated_for(entry, month));
        purged += before - list.len();
    }
    model.entries.retain(|_, list| !list.is_empty());
    purged
}

fn credit_salaries(model: &mut MonthlyModel, month: MonthKey, day: u32) -> usize {
    let date = month.clamp_day(day);
    let credits: Vec<(String, Entry)> = model
        .groups
        .iter()
        .filter(|group| group.is_salary())
        .filter_map(|group| {
            let pool = coerce_amount(group.pool);
            if pool <= 0.0 {
                return None;
            }
            let entry = Entry {
                date,
                amount: pool,
                kind: EntryKind::Income,
                memo: format!("Salary: {}", group.name),
                source: EntrySource::AutoSalary {
                    group_id: group.id.clone(),
                    month,
                },
            };
            Some((main_category_id(&group.id), entry))
        })
        .collect();
    let count = credits.len();
    for (category_id, entry) in credits {
        model.entries.entry(category_id).or_default().push(entry);
    }
    count
}

fn sweep_allocations(model: &mut MonthlyModel, month: MonthKey, day: u32) -> usize {
    let date = month.clamp_day(day);
    let mut postings: Vec<(String, Entry)> = Vec::new();
    for group in &model.groups {
        let main_id = main_category_id(&group.id);
        if model.category(&main_id).is_none() {
            continue;
        }
        for category in model.sub_categories(&group.id) {
            let amount = coerce_amount(category.amount);
            if amount <= 0.0 {
                continue;
            }
            let source = EntrySource::AutoAllocation {
                group_id: group.id.clone(),
                category_id: category.id.clone(),
                month,
            };
            let memo = format!("Allocation: {}", category.name);
            postings.push((
                main_id.clone(),
                Entry {
                    date,
                    amount,
                    kind: EntryKind::Expense,
                    memo: memo.clone(),
                    source: source.clone(),
                },
            ));
            postings.push((
                category.id.clone(),
                Entry {
                    date,
                    amount,
                    kind: EntryKind::Income,
                    memo,
                    source,
                },
            ));
        }
    }
    let pairs = postings.len() / 2;
    for (category_id, entry) in postings {
        model.entries.entry(category_id).or_default().push(entry);
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Group, GroupKind};
    use chrono::NaiveDate;

    fn month(raw: &str) -> MonthKey {
        MonthKey::parse(raw).unwrap()
    }

    fn salary_model(raw_month: &str) -> MonthlyModel {
        let mut model = MonthlyModel::empty(month(raw_month));
        model
            .groups
            .push(Group::new("salary", "월급통장", GroupKind::Salary).with_pool(1_000.0));
        model
            .categories
            .push(Category::new("food", "밥값", "salary").with_amount(200.0));
        model
    }

    #[test]
    fn guarantor_runs_before_phases() {
        let model = apply_automations(salary_model("2025-08"), month("2025-08"));
        assert!(model.category("main_salary").is_some());
        assert_eq!(model.entries_for("main_salary").len(), 2);
        assert_eq!(model.entries_for("food").len(), 1);
    }

    #[test]
    fn schedule_controls_entry_dates() {
        let schedule = AutomationSchedule {
            salary_day: 10,
            allocation_day: 31,
        };
        let model = apply_automations_with(salary_model("2025-04"), month("2025-04"), &schedule);
        let main = model.entries_for("main_salary");
        assert_eq!(main[0].date, NaiveDate::from_ymd_opt(2025, 4, 10).unwrap());
        assert_eq!(main[1].date, NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
    }

    #[test]
    fn generic_groups_get_no_salary() {
        let mut model = salary_model("2025-08");
        model.groups[0].kind = GroupKind::Generic;
        let model = apply_automations(model, month("2025-08"));
        let main = model.entries_for("main_salary");
        assert_eq!(main.len(), 1);
        assert_eq!(main[0].kind, EntryKind::Expense);
    }

    #[test]
    fn toggling_away_from_salary_purges_previous_credit() {
        let model = apply_automations(salary_model("2025-08"), month("2025-08"));
        let mut model = model;
        model.groups[0].kind = GroupKind::Generic;
        let model = apply_automations(model, month("2025-08"));
        assert!(model
            .entries_for("main_salary")
            .iter()
            .all(|entry| !matches!(entry.source, EntrySource::AutoSalary { .. })));
    }

    #[test]
    fn allocation_for_deleted_category_disappears_on_rerun() {
        let model = apply_automations(salary_model("2025-08"), month("2025-08"));
        let mut model = model;
        model.categories.retain(|category| category.id != "food");
        model.entries.remove("food");
        let model = apply_automations(model, month("2025-08"));
        assert_eq!(model.entries_for("main_salary").len(), 1);
    }

    #[test]
    fn orphan_sub_category_is_skipped() {
        let mut model = salary_model("2025-08");
        model
            .categories
            .push(Category::new("lost", "Lost", "missing-group").with_amount(50.0));
        let model = apply_automations(model, month("2025-08"));
        assert!(model.entries_for("lost").is_empty());
    }
}
