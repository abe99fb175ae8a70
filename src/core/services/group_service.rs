use crate::domain::{main_category_id, main_category_name, Category, Group, GroupKind, MonthlyModel};
use crate::errors::{BudgetError, Result};

use super::{generate_id, required_name};

pub struct GroupService;

impl GroupService {
    /// Adds a group together with its main category and returns the new id.
    pub fn create(model: &mut MonthlyModel, name: &str, kind: GroupKind) -> Result<String> {
        let name = required_name(name, "Group")?;
        let id = generate_id("grp", |candidate| {
            model.group(candidate).is_some() || model.category(&main_category_id(candidate)).is_some()
        });
        model.categories.push(Category::main_for(&id, &name));
        model.groups.push(Group::new(id.clone(), name, kind));
        Ok(id)
    }

    /// Renames a group and keeps its main category's name in step.
    pub fn rename(model: &mut MonthlyModel, id: &str, name: &str) -> Result<()> {
        let name = required_name(name, "Group")?;
        let group = model
            .group_mut(id)
            .ok_or_else(|| BudgetError::GroupNotFound(id.to_string()))?;
        group.name = name.clone();
        if let Some(main) = model.category_mut(&main_category_id(id)) {
            main.name = main_category_name(&name);
        }
        Ok(())
    }

    /// Flips a group between salary and generic, returning the new kind.
    pub fn toggle_kind(model: &mut MonthlyModel, id: &str) -> Result<GroupKind> {
        let group = model
            .group_mut(id)
            .ok_or_else(|| BudgetError::GroupNotFound(id.to_string()))?;
        group.kind = group.kind.toggled();
        Ok(group.kind)
    }

    pub fn set_pool(model: &mut MonthlyModel, id: &str, pool: f64) -> Result<()> {
        let group = model
            .group_mut(id)
            .ok_or_else(|| BudgetError::GroupNotFound(id.to_string()))?;
        group.pool = crate::domain::coerce_amount(pool);
        Ok(())
    }

    /// Removes a group, its categories, and every entry keyed by those categories.
    pub fn delete(model: &mut MonthlyModel, id: &str) -> Result<Group> {
        let position = model
            .groups
            .iter()
            .position(|group| group.id == id)
            .ok_or_else(|| BudgetError::GroupNotFound(id.to_string()))?;
        let main_id = main_category_id(id);
        let mut doomed: Vec<String> = model
            .categories
            .iter()
            .filter(|category| category.group_id == id)
            .map(|category| category.id.clone())
            .collect();
        doomed.push(main_id);

        model
            .categories
            .retain(|category| !doomed.contains(&category.id));
        model.entries.retain(|category_id, _| !doomed.contains(category_id));
        Ok(model.groups.remove(position))
    }

    /// Whether deleting the group would also delete user-created categories.
    pub fn has_sub_categories(model: &MonthlyModel, id: &str) -> bool {
        model.sub_categories(id).next().is_some()
    }

    pub fn list(model: &MonthlyModel) -> Vec<&Group> {
        model.groups.iter().collect()
    }
}
