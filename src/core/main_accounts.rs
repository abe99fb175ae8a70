//! Keeps the one-main-category-per-group invariant.

use std::collections::HashSet;

use crate::domain::{main_category_id, Category, MonthlyModel};

/// Returns `model` with a main category synthesized for every group that lacks one.
pub fn ensure_main_categories(mut model: MonthlyModel) -> MonthlyModel {
    ensure_main_categories_in_place(&mut model);
    model
}

/// In-place variant of [`ensure_main_categories`]; returns how many were added.
pub fn ensure_main_categories_in_place(model: &mut MonthlyModel) -> usize {
    let existing: HashSet<&str> = model
        .categories
        .iter()
        .map(|category| category.id.as_str())
        .collect();
    let missing: Vec<Category> = model
        .groups
        .iter()
        .filter(|group| !existing.contains(main_category_id(&group.id).as_str()))
        .map(|group| Category::main_for(&group.id, &group.name))
        .collect();
    let added = missing.len();
    if added > 0 {
        tracing::debug!(month = %model.month, added, "restored missing main categories");
        model.categories.extend(missing);
    }
    added
}
