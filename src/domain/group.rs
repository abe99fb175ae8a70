//! Top-level budget groups (salary account, savings account, ...).

use std::fmt;

use serde::{de::Deserializer, Deserialize, Serialize};

use super::common::{lenient_amount, lenient_string, Identifiable, NamedEntity};

/// A budget bucket that owns one main category and any number of sub-categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: GroupKind,
    /// Salary credited each month for salary groups, a budget total otherwise.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub pool: f64,
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            pool: 0.0,
        }
    }

    pub fn with_pool(mut self, pool: f64) -> Self {
        self.pool = pool;
        self
    }

    pub fn is_salary(&self) -> bool {
        self.kind == GroupKind::Salary
    }
}

impl Identifiable for Group {
    fn id(&self) -> &str {
        &self.id
    }
}

impl NamedEntity for Group {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Salary,
    #[default]
    Generic,
}

impl GroupKind {
    pub fn toggled(self) -> Self {
        match self {
            GroupKind::Salary => GroupKind::Generic,
            GroupKind::Generic => GroupKind::Salary,
        }
    }

    pub fn from_label(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "salary" => GroupKind::Salary,
            _ => GroupKind::Generic,
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GroupKind::Salary => "salary",
            GroupKind::Generic => "generic",
        };
        f.write_str(label)
    }
}

impl<'de> Deserialize<'de> for GroupKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value
            .map(|raw| GroupKind::from_label(&raw))
            .unwrap_or_default())
    }
}
