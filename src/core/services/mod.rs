pub mod category_service;
pub mod entry_service;
pub mod group_service;
pub mod summary_service;

pub use category_service::CategoryService;
pub use entry_service::EntryService;
pub use group_service::GroupService;
pub use summary_service::{CategoryBalance, DatedEntry, GroupSummary, SummaryService};

use uuid::Uuid;

use crate::errors::{BudgetError, Result};

/// What a mutation touched, so callers know whether automations must be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeImpact {
    /// Names, bank labels, manual entries.
    Ledger,
    /// Pools, group types, allocation amounts, or removed groups and categories.
    Automation,
}

impl ChangeImpact {
    pub fn needs_automation(self) -> bool {
        self == ChangeImpact::Automation
    }
}

/// Trims a user-supplied name and rejects it when nothing is left.
pub(crate) fn required_name(raw: &str, what: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(BudgetError::InvalidInput(format!("{what} name is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Generates a short unique id such as `grp_1f3a9c0d2e`.
pub(crate) fn generate_id(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    loop {
        let raw = Uuid::new_v4().simple().to_string();
        let candidate = format!("{prefix}_{}", &raw[..10]);
        if !taken(&candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_name_trims_and_rejects_blank() {
        assert_eq!(required_name("  Savings ", "Group").unwrap(), "Savings");
        let err = required_name("   ", "Group").expect_err("blank names are rejected");
        assert!(matches!(err, BudgetError::InvalidInput(ref message) if message.contains("Group")));
    }

    #[test]
    fn generated_ids_use_prefix() {
        let id = generate_id("cat", |_| false);
        assert!(id.starts_with("cat_"));
        assert_eq!(id.len(), "cat_".len() + 10);
    }
}
