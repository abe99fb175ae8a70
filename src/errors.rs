use std::result::Result as StdResult;

use thiserror::Error;

use crate::domain::MonthParseError;

/// Unified error type for the domain, storage, and sync layers.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("Group not found: {0}")]
    GroupNotFound(String),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Entry {index} not found in category {category_id}")]
    EntryNotFound { category_id: String, index: usize },
    #[error("Main category `{0}` is managed by its group and cannot be changed directly")]
    MainCategoryProtected(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid backup: {0}")]
    InvalidBackup(String),
    #[error("Persistence error: {0}")]
    StorageError(String),
    #[error("Remote sync error: {0}")]
    RemoteError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = StdResult<T, BudgetError>;

impl From<std::io::Error> for BudgetError {
    fn from(err: std::io::Error) -> Self {
        BudgetError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for BudgetError {
    fn from(err: serde_json::Error) -> Self {
        BudgetError::StorageError(err.to_string())
    }
}

impl From<MonthParseError> for BudgetError {
    fn from(err: MonthParseError) -> Self {
        BudgetError::InvalidInput(err.to_string())
    }
}

impl From<crate::config::ConfigError> for BudgetError {
    fn from(err: crate::config::ConfigError) -> Self {
        BudgetError::ConfigError(err.to_string())
    }
}
