//! Automation engine, mutation services, and the session tying them to storage.

pub mod automation;
pub mod main_accounts;
pub mod services;
pub mod session;

pub use automation::{
    apply_automations, apply_automations_with, AutomationOutcome, AutomationSchedule,
};
pub use main_accounts::ensure_main_categories;
pub use services::ChangeImpact;
pub use session::BudgetSession;
