//! Ledger lines and the marker that identifies automation output.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{common::lenient_amount, month::MonthKey};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub memo: String,
    #[serde(default, skip_serializing_if = "EntrySource::is_manual")]
    pub source: EntrySource,
}

impl Entry {
    /// Creates a manually entered line.
    pub fn manual(date: NaiveDate, amount: f64, kind: EntryKind, memo: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            kind,
            memo: memo.into(),
            source: EntrySource::Manual,
        }
    }

    pub fn is_automated(&self) -> bool {
        !self.source.is_manual()
    }

    /// Signed contribution of the entry to its category balance.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            EntryKind::Income => self.amount,
            EntryKind::Expense => -self.amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        };
        f.write_str(label)
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" | "in" => Ok(EntryKind::Income),
            "expense" | "out" => Ok(EntryKind::Expense),
            other => Err(format!("unknown entry type `{other}`")),
        }
    }
}

/// Who produced an entry. Automation output carries enough identity to be
/// found and regenerated; manual entries carry none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EntrySource {
    #[default]
    Manual,
    AutoSalary {
        #[serde(rename = "groupId")]
        group_id: String,
        month: MonthKey,
    },
    AutoAllocation {
        #[serde(rename = "groupId")]
        group_id: String,
        #[serde(rename = "categoryId")]
        category_id: String,
        month: MonthKey,
    },
}

impl EntrySource {
    pub fn is_manual(&self) -> bool {
        matches!(self, EntrySource::Manual)
    }

    /// Recovers a marker from the memo grammar used by older data files:
    /// `SALARY:<groupId>:<YYYY-MM>` and `ALLOC:<groupId>:<categoryId>:<YYYY-MM>`.
    pub fn from_legacy_memo(memo: &str) -> Option<Self> {
        let parts: Vec<&str> = memo.split(':').collect();
        match parts.as_slice() {
            ["SALARY", group_id, month] if !group_id.is_empty() => Some(EntrySource::AutoSalary {
                group_id: group_id.to_string(),
                month: month.parse().ok()?,
            }),
            ["ALLOC", group_id, category_id, month]
                if !group_id.is_empty() && !category_id.is_empty() =>
            {
                Some(EntrySource::AutoAllocation {
                    group_id: group_id.to_string(),
                    category_id: category_id.to_string(),
                    month: month.parse().ok()?,
                })
            }
            _ => None,
        }
    }
}
