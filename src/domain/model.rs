//! The per-month household budget model and the template fresh months start from.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    category::{main_category_id, Category},
    common::find_by_id,
    entry::Entry,
    group::{Group, GroupKind},
    month::MonthKey,
};

/// Groups, categories, and ledger entries for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyModel {
    pub month: MonthKey,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Entries keyed by category id.
    #[serde(default)]
    pub entries: BTreeMap<String, Vec<Entry>>,
}

impl MonthlyModel {
    pub fn empty(month: MonthKey) -> Self {
        Self {
            month,
            groups: Vec::new(),
            categories: Vec::new(),
            entries: BTreeMap::new(),
        }
    }

    /// Builds the model a month starts with before anything was recorded.
    pub fn initial(month: MonthKey, template: &ModelTemplate) -> Self {
        let mut categories: Vec<Category> = template
            .groups
            .iter()
            .map(|group| Category::main_for(&group.id, &group.name))
            .collect();
        categories.extend(template.categories.iter().cloned().map(|mut category| {
            category.is_main = false;
            category
        }));
        Self {
            month,
            groups: template.groups.clone(),
            categories,
            entries: BTreeMap::new(),
        }
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        find_by_id(&self.groups, id)
    }

    pub fn group_mut(&mut self, id: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|group| group.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        find_by_id(&self.categories, id)
    }

    pub fn category_mut(&mut self, id: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|category| category.id == id)
    }

    pub fn main_category(&self, group_id: &str) -> Option<&Category> {
        self.category(&main_category_id(group_id))
    }

    /// Non-main categories of a group, in model order.
    pub fn sub_categories<'a>(&'a self, group_id: &'a str) -> impl Iterator<Item = &'a Category> {
        self.categories
            .iter()
            .filter(move |category| category.group_id == group_id && !category.is_main)
    }

    pub fn entries_for(&self, category_id: &str) -> &[Entry] {
        self.entries
            .get(category_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates every entry with its category id and position.
    pub fn all_entries(&self) -> impl Iterator<Item = (&str, usize, &Entry)> {
        self.entries.iter().flat_map(|(category_id, list)| {
            list.iter()
                .enumerate()
                .map(move |(index, entry)| (category_id.as_str(), index, entry))
        })
    }

    pub fn entries_on(&self, date: NaiveDate) -> impl Iterator<Item = (&str, usize, &Entry)> {
        self.all_entries().filter(move |(_, _, entry)| entry.date == date)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// Default groups and categories copied into every freshly created month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTemplate {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Default for ModelTemplate {
    fn default() -> Self {
        let groups = vec![
            Group::new("salary", "월급통장", GroupKind::Salary),
            Group::new("savings", "저축통장", GroupKind::Generic),
        ];
        let categories = [
            ("living", "생활비 통장", "salary"),
            ("academy", "학원비 통장", "salary"),
            ("food", "밥값 통장", "salary"),
            ("phone", "통신비 통장", "salary"),
            ("allowance", "용돈 통장", "salary"),
            ("siu", "시우 통장", "savings"),
            ("seonwoo", "선우 통장", "savings"),
        ]
        .into_iter()
        .map(|(id, name, group)| Category::new(id, name, group))
        .collect();
        Self { groups, categories }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_model_has_main_category_per_group() {
        let month = MonthKey::parse("2025-08").unwrap();
        let model = MonthlyModel::initial(month, &ModelTemplate::default());
        assert_eq!(model.groups.len(), 2);
        assert_eq!(model.categories.len(), 9);
        assert!(model.main_category("salary").unwrap().is_main);
        assert!(model.main_category("savings").unwrap().is_main);
        assert_eq!(model.sub_categories("salary").count(), 5);
        assert!(model.entries.is_empty());
    }

    #[test]
    fn decodes_original_record_shape() {
        let raw = r#"{
            "month": "2025-08",
            "groups": [{"id": "salary", "name": "월급통장", "type": "salary", "pool": 3000000}],
            "categories": [
                {"id": "main_salary", "name": "월급통장 (메인)", "amount": 0, "groupId": "salary", "isMain": true, "bankName": ""},
                {"id": "food", "name": "밥값 통장", "amount": 300000, "groupId": "salary", "isMain": false}
            ],
            "entries": {"food": [{"date": "2025-08-03", "amount": 9000, "type": "expense", "memo": "lunch"}]}
        }"#;
        let model: MonthlyModel = serde_json::from_str(raw).unwrap();
        assert_eq!(model.group("salary").unwrap().pool, 3_000_000.0);
        assert_eq!(model.entries_for("food").len(), 1);
        assert_eq!(model.entries_for("living").len(), 0);
        assert_eq!(model.category("food").unwrap().bank_name, "");
    }
}
