//! Pure data types for the monthly household budget. No I/O.

pub mod category;
pub mod common;
pub mod entry;
pub mod group;
pub mod model;
pub mod month;

pub use category::{main_category_id, main_category_name, Category};
pub use common::{coerce_amount, parse_amount, Identifiable, NamedEntity};
pub use entry::{Entry, EntryKind, EntrySource};
pub use group::{Group, GroupKind};
pub use model::{ModelTemplate, MonthlyModel};
pub use month::{MonthKey, MonthParseError};
