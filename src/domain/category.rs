//! Sub-ledgers ("accounts") that live under a group.

use serde::{Deserialize, Serialize};

use super::common::{lenient_amount, lenient_string, Identifiable, NamedEntity};

const MAIN_ID_PREFIX: &str = "main_";
const MAIN_NAME_SUFFIX: &str = " (메인)";
const LEGACY_GROUP_FALLBACK: &str = "salary";

/// Deterministic id of the main category that belongs to `group_id`.
pub fn main_category_id(group_id: &str) -> String {
    format!("{MAIN_ID_PREFIX}{group_id}")
}

/// Display name of the main category for a group called `group_name`.
pub fn main_category_name(group_name: &str) -> String {
    format!("{group_name}{MAIN_NAME_SUFFIX}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Amount swept from the group's main category on the allocation day.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default = "legacy_group_fallback", alias = "group")]
    pub group_id: String,
    #[serde(default)]
    pub is_main: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bank_name: String,
}

fn legacy_group_fallback() -> String {
    LEGACY_GROUP_FALLBACK.to_string()
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            amount: 0.0,
            group_id: group_id.into(),
            is_main: false,
            bank_name: String::new(),
        }
    }

    /// Builds the main category for a group.
    pub fn main_for(group_id: &str, group_name: &str) -> Self {
        Self {
            id: main_category_id(group_id),
            name: main_category_name(group_name),
            amount: 0.0,
            group_id: group_id.to_string(),
            is_main: true,
            bank_name: String::new(),
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_bank_name(mut self, bank_name: impl Into<String>) -> Self {
        self.bank_name = bank_name.into();
        self
    }
}

impl Identifiable for Category {
    fn id(&self) -> &str {
        &self.id
    }
}

impl NamedEntity for Category {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_category_identity_is_derived_from_group() {
        let main = Category::main_for("salary", "월급통장");
        assert_eq!(main.id, "main_salary");
        assert_eq!(main.name, "월급통장 (메인)");
        assert!(main.is_main);
        assert_eq!(main.amount, 0.0);
    }

    #[test]
    fn decodes_legacy_category_shape() {
        let category: Category =
            serde_json::from_str(r#"{"id":"food","name":"밥값","amount":"300000","group":"salary","bankName":null}"#)
                .unwrap();
        assert_eq!(category.group_id, "salary");
        assert_eq!(category.amount, 300_000.0);
        assert_eq!(category.bank_name, "");
        assert!(!category.is_main);
    }

    #[test]
    fn serializes_camel_case_fields() {
        let category = Category::new("living", "생활비", "salary").with_bank_name("농협");
        let json = serde_json::to_value(&category).unwrap();
        assert_eq!(json["groupId"], "salary");
        assert_eq!(json["isMain"], false);
        assert_eq!(json["bankName"], "농협");
    }
}
