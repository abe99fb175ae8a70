use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::domain::MonthlyModel;
use crate::errors::Result;
use crate::utils::clock::Clock;

use super::RemoteStore;

pub const DEFAULT_DEBOUNCE_MS: u64 = 1500;

#[derive(Debug, Clone)]
struct PendingWrite {
    model: MonthlyModel,
    due: DateTime<Utc>,
}

/// Debounced writer pushing local models to a room.
///
/// Each [`schedule`](RemoteSync::schedule) replaces the pending write and
/// restarts the timer. While a remote snapshot is being applied, scheduling is
/// ignored so the snapshot is never echoed back.
pub struct RemoteSync {
    room_id: String,
    debounce: Duration,
    clock: Arc<dyn Clock>,
    pending: Option<PendingWrite>,
    applying_remote: bool,
    last_sent: Option<MonthlyModel>,
}

impl RemoteSync {
    pub fn new(room_id: impl Into<String>, debounce_ms: u64, clock: Arc<dyn Clock>) -> Self {
        let millis = i64::try_from(debounce_ms).unwrap_or(i64::MAX);
        Self {
            room_id: room_id.into(),
            debounce: Duration::milliseconds(millis),
            clock,
            pending: None,
            applying_remote: false,
            last_sent: None,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_due(&self) -> Option<DateTime<Utc>> {
        self.pending.as_ref().map(|pending| pending.due)
    }

    pub fn is_applying_remote(&self) -> bool {
        self.applying_remote
    }

    /// Queues `model` for writing. Returns false when suppressed by a remote apply.
    pub fn schedule(&mut self, model: &MonthlyModel) -> bool {
        if self.applying_remote {
            debug!(month = %model.month, "remote apply in progress, write not scheduled");
            return false;
        }
        let due = self.clock.now() + self.debounce;
        debug!(month = %model.month, %due, "remote write scheduled");
        self.pending = Some(PendingWrite {
            model: model.clone(),
            due,
        });
        true
    }

    /// Writes the pending model if its timer has elapsed.
    pub fn flush_due(&mut self, remote: &dyn RemoteStore) -> Result<bool> {
        match &self.pending {
            Some(pending) if pending.due <= self.clock.now() => self.flush_now(remote),
            _ => Ok(false),
        }
    }

    /// Writes the pending model immediately. On failure the write stays pending.
    pub fn flush_now(&mut self, remote: &dyn RemoteStore) -> Result<bool> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };
        let month = pending.model.month;
        match remote.write(&self.room_id, month, &pending.model) {
            Ok(()) => {
                debug!(room = %self.room_id, %month, "remote write flushed");
                self.last_sent = Some(pending.model);
                Ok(true)
            }
            Err(err) => {
                warn!(room = %self.room_id, %month, error = %err, "remote write failed");
                self.pending = Some(pending);
                Err(err)
            }
        }
    }

    /// True when `snapshot` is exactly what this writer last sent.
    pub fn is_echo(&self, snapshot: &MonthlyModel) -> bool {
        self.last_sent.as_ref() == Some(snapshot)
    }

    /// Enters the remote-apply window. The incoming snapshot wins, so any
    /// pending local write is dropped and the last sent model no longer
    /// describes the room.
    pub fn begin_remote_apply(&mut self) {
        if self.pending.take().is_some() {
            debug!(room = %self.room_id, "pending write superseded by remote snapshot");
        }
        self.last_sent = None;
        self.applying_remote = true;
    }

    pub fn end_remote_apply(&mut self) {
        self.applying_remote = false;
    }
}
