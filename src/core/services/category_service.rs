use crate::domain::{coerce_amount, Category, MonthlyModel};
use crate::errors::{BudgetError, Result};

use super::{generate_id, required_name};

pub struct CategoryService;

impl CategoryService {
    /// Adds a sub-category under `group_id` and returns its id.
    pub fn create(
        model: &mut MonthlyModel,
        group_id: &str,
        name: &str,
        bank_name: &str,
    ) -> Result<String> {
        let name = required_name(name, "Category")?;
        if model.group(group_id).is_none() {
            return Err(BudgetError::GroupNotFound(group_id.to_string()));
        }
        let id = generate_id("cat", |candidate| model.category(candidate).is_some());
        model
            .categories
            .push(Category::new(id.clone(), name, group_id).with_bank_name(bank_name.trim()));
        Ok(id)
    }

    pub fn rename(model: &mut MonthlyModel, id: &str, name: &str) -> Result<()> {
        let name = required_name(name, "Category")?;
        Self::editable_mut(model, id)?.name = name;
        Ok(())
    }

    pub fn set_bank_name(model: &mut MonthlyModel, id: &str, bank_name: &str) -> Result<()> {
        let category = model
            .category_mut(id)
            .ok_or_else(|| BudgetError::CategoryNotFound(id.to_string()))?;
        category.bank_name = bank_name.trim().to_string();
        Ok(())
    }

    /// Sets the allocation target swept from the group's main category.
    pub fn set_amount(model: &mut MonthlyModel, id: &str, amount: f64) -> Result<()> {
        Self::editable_mut(model, id)?.amount = coerce_amount(amount);
        Ok(())
    }

    /// Removes a sub-category and its entries. Main categories are rejected untouched.
    pub fn delete(model: &mut MonthlyModel, id: &str) -> Result<Category> {
        Self::editable_mut(model, id)?;
        let position = model
            .categories
            .iter()
            .position(|category| category.id == id)
            .ok_or_else(|| BudgetError::CategoryNotFound(id.to_string()))?;
        model.entries.remove(id);
        Ok(model.categories.remove(position))
    }

    /// Lets callers warn before deleting a category that still has history.
    pub fn has_entries(model: &MonthlyModel, id: &str) -> bool {
        !model.entries_for(id).is_empty()
    }

    /// Sub-categories of a group, i.e. the rows of its allocation table.
    pub fn allocations<'a>(model: &'a MonthlyModel, group_id: &'a str) -> Vec<&'a Category> {
        model.sub_categories(group_id).collect()
    }

    fn editable_mut<'a>(model: &'a mut MonthlyModel, id: &str) -> Result<&'a mut Category> {
        let category = model
            .category_mut(id)
            .ok_or_else(|| BudgetError::CategoryNotFound(id.to_string()))?;
        if category.is_main {
            return Err(BudgetError::MainCategoryProtected(id.to_string()));
        }
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entry, EntryKind, ModelTemplate, MonthKey};
    use chrono::NaiveDate;

    fn model() -> MonthlyModel {
        MonthlyModel::initial(MonthKey::parse("2025-08").unwrap(), &ModelTemplate::default())
    }

    #[test]
    fn create_requires_existing_group() {
        let mut model = model();
        let id = CategoryService::create(&mut model, "savings", "여행 통장", " 카뱅 ").unwrap();
        let created = model.category(&id).unwrap();
        assert_eq!(created.bank_name, "카뱅");
        assert!(!created.is_main);
        assert!(matches!(
            CategoryService::create(&mut model, "ghost", "x", ""),
            Err(BudgetError::GroupNotFound(_))
        ));
    }

    #[test]
    fn main_category_cannot_be_deleted() {
        let mut model = model();
        let before = model.clone();
        let err = CategoryService::delete(&mut model, "main_salary").expect_err("protected");
        assert!(matches!(err, BudgetError::MainCategoryProtected(ref id) if id == "main_salary"));
        assert_eq!(model, before);
    }

    #[test]
    fn main_category_rejects_rename_and_amount() {
        let mut model = model();
        assert!(CategoryService::rename(&mut model, "main_salary", "x").is_err());
        assert!(CategoryService::set_amount(&mut model, "main_salary", 5.0).is_err());
        assert_eq!(model.category("main_salary").unwrap().amount, 0.0);
    }

    #[test]
    fn delete_removes_entries_and_reports_history() {
        let mut model = model();
        let date = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();
        assert!(!CategoryService::has_entries(&model, "food"));
        model
            .entries
            .entry("food".into())
            .or_default()
            .push(Entry::manual(date, 8_000.0, EntryKind::Expense, "lunch"));
        assert!(CategoryService::has_entries(&model, "food"));

        let removed = CategoryService::delete(&mut model, "food").unwrap();
        assert_eq!(removed.id, "food");
        assert!(model.category("food").is_none());
        assert!(model.entries.get("food").is_none());
    }

    #[test]
    fn set_amount_coerces_non_finite_values() {
        let mut model = model();
        CategoryService::set_amount(&mut model, "food", f64::INFINITY).unwrap();
        assert_eq!(model.category("food").unwrap().amount, 0.0);
        CategoryService::set_amount(&mut model, "food", 300_000.0).unwrap();
        assert_eq!(CategoryService::allocations(&model, "salary").len(), 5);
    }
}
