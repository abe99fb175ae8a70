use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard,
    },
};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

use crate::domain::{MonthKey, MonthlyModel};
use crate::errors::{BudgetError, Result};

use super::RemoteStore;

type DocumentKey = (String, MonthKey);

#[derive(Default)]
struct RemoteState {
    documents: HashMap<DocumentKey, MonthlyModel>,
    subscribers: HashMap<DocumentKey, Vec<Sender<MonthlyModel>>>,
}

/// In-process remote used for tests and for sessions sharing one process.
#[derive(Default)]
pub struct MemoryRemote {
    state: Mutex<RemoteState>,
    offline: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every write fails with a remote error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn document_count(&self) -> usize {
        self.lock().documents.len()
    }

    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RemoteStore for MemoryRemote {
    fn write(&self, room: &str, month: MonthKey, model: &MonthlyModel) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BudgetError::RemoteError(format!(
                "room `{room}` is unreachable"
            )));
        }
        let key = (room.to_string(), month);
        let mut state = self.lock();
        state.documents.insert(key.clone(), model.clone());
        if let Some(subscribers) = state.subscribers.get_mut(&key) {
            subscribers.retain(|tx| tx.send(model.clone()).is_ok());
            debug!(room, %month, listeners = subscribers.len(), "remote write delivered");
        }
        Ok(())
    }

    fn fetch(&self, room: &str, month: MonthKey) -> Result<Option<MonthlyModel>> {
        Ok(self.lock().documents.get(&(room.to_string(), month)).cloned())
    }

    fn subscribe(&self, room: &str, month: MonthKey) -> Result<Receiver<MonthlyModel>> {
        let (tx, rx) = unbounded();
        self.lock()
            .subscribers
            .entry((room.to_string(), month))
            .or_default()
            .push(tx);
        Ok(rx)
    }
}
