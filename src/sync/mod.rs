//! Shared remote copy of the monthly models, last write wins.

pub mod debounce;
pub mod memory;

pub use debounce::RemoteSync;
pub use memory::MemoryRemote;

use crossbeam_channel::Receiver;

use crate::domain::{MonthKey, MonthlyModel};
use crate::errors::Result;

/// A document store shared by everyone in a room, addressed by month.
pub trait RemoteStore: Send + Sync {
    fn write(&self, room: &str, month: MonthKey, model: &MonthlyModel) -> Result<()>;

    fn fetch(&self, room: &str, month: MonthKey) -> Result<Option<MonthlyModel>>;

    /// Every later write to the document is delivered on the returned channel.
    fn subscribe(&self, room: &str, month: MonthKey) -> Result<Receiver<MonthlyModel>>;
}
