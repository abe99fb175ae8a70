use std::sync::Arc;

use crossbeam_channel::Receiver;
use tracing::{info, warn};

use crate::domain::{Entry, GroupKind, MonthKey, MonthlyModel};
use crate::errors::Result;
use crate::storage::{repository::migrate_legacy_tags, KeyValueStore, ModelRepository};
use crate::sync::{RemoteStore, RemoteSync};

use super::automation::{apply_automations_with, AutomationSchedule};
use super::main_accounts::ensure_main_categories_in_place;
use super::services::{CategoryService, ChangeImpact, EntryService, GroupService};

struct RemoteLink {
    sync: RemoteSync,
    remote: Arc<dyn RemoteStore>,
    subscription: Receiver<MonthlyModel>,
}

/// Active month plus everything needed to mutate, persist, and share it.
///
/// Every mutator validates first, persists on success, and re-runs the
/// automation engine when the change affects generated entries.
pub struct BudgetSession<S: KeyValueStore> {
    repository: ModelRepository<S>,
    schedule: AutomationSchedule,
    model: MonthlyModel,
    notes: Vec<String>,
    remote: Option<RemoteLink>,
}

impl<S: KeyValueStore> BudgetSession<S> {
    /// Loads `month`, applies automations, and persists the result.
    pub fn open(
        repository: ModelRepository<S>,
        schedule: AutomationSchedule,
        month: MonthKey,
    ) -> Result<Self> {
        let mut session = Self {
            repository,
            schedule,
            model: MonthlyModel::empty(month),
            notes: Vec::new(),
            remote: None,
        };
        session.load_active(month)?;
        info!(%month, "session opened");
        Ok(session)
    }

    /// Joins a shared room. An existing remote copy of the active month wins
    /// over the local one; otherwise the local model is queued for upload.
    pub fn attach_remote(&mut self, remote: Arc<dyn RemoteStore>, sync: RemoteSync) -> Result<()> {
        let month = self.month();
        let subscription = remote.subscribe(sync.room_id(), month)?;
        let existing = remote.fetch(sync.room_id(), month)?;
        self.remote = Some(RemoteLink {
            sync,
            remote,
            subscription,
        });
        match existing {
            Some(snapshot) => {
                self.apply_remote_snapshot(snapshot)?;
            }
            None => self.schedule_remote(),
        }
        Ok(())
    }

    pub fn month(&self) -> MonthKey {
        self.model.month
    }

    pub fn model(&self) -> &MonthlyModel {
        &self.model
    }

    pub fn schedule(&self) -> &AutomationSchedule {
        &self.schedule
    }

    pub fn repository(&self) -> &ModelRepository<S> {
        &self.repository
    }

    /// Warnings and migrations reported when the active month was loaded.
    pub fn load_notes(&self) -> &[String] {
        &self.notes
    }

    pub fn is_shared(&self) -> bool {
        self.remote.is_some()
    }

    pub fn has_pending_remote(&self) -> bool {
        self.remote
            .as_ref()
            .map(|link| link.sync.has_pending())
            .unwrap_or(false)
    }

    /// Saves the active month and moves to `month`.
    pub fn switch_month(&mut self, month: MonthKey) -> Result<()> {
        if month == self.month() {
            return Ok(());
        }
        if let Err(err) = self.flush_remote() {
            warn!(error = %err, "pending remote write lost on month switch");
        }
        self.load_active(month)?;
        let existing = match self.remote.as_mut() {
            Some(link) => {
                link.subscription = link.remote.subscribe(link.sync.room_id(), month)?;
                link.remote.fetch(link.sync.room_id(), month)?
            }
            None => None,
        };
        if let Some(snapshot) = existing {
            self.apply_remote_snapshot(snapshot)?;
        }
        info!(%month, "switched month");
        Ok(())
    }

    /// Recomputes the automated entries of the active month and persists them.
    pub fn refresh_automations(&mut self) -> Result<()> {
        self.automate();
        self.persist()
    }

    /// Replaces the active month with a fresh copy of the template.
    pub fn reset_month(&mut self) -> Result<()> {
        let month = self.month();
        self.model = MonthlyModel::initial(month, self.repository.template());
        info!(%month, "month reset to template");
        self.refresh_automations()
    }

    pub fn create_group(&mut self, name: &str, kind: GroupKind) -> Result<String> {
        self.mutate(ChangeImpact::Automation, |model| {
            GroupService::create(model, name, kind)
        })
    }

    pub fn rename_group(&mut self, id: &str, name: &str) -> Result<()> {
        self.mutate(ChangeImpact::Ledger, |model| GroupService::rename(model, id, name))
    }

    pub fn toggle_group_kind(&mut self, id: &str) -> Result<GroupKind> {
        self.mutate(ChangeImpact::Automation, |model| {
            GroupService::toggle_kind(model, id)
        })
    }

    pub fn set_group_pool(&mut self, id: &str, pool: f64) -> Result<()> {
        self.mutate(ChangeImpact::Automation, |model| {
            GroupService::set_pool(model, id, pool)
        })
    }

    pub fn delete_group(&mut self, id: &str) -> Result<()> {
        self.mutate(ChangeImpact::Automation, |model| {
            GroupService::delete(model, id).map(|_| ())
        })
    }

    pub fn create_category(&mut self, group_id: &str, name: &str, bank_name: &str) -> Result<String> {
        self.mutate(ChangeImpact::Ledger, |model| {
            CategoryService::create(model, group_id, name, bank_name)
        })
    }

    pub fn rename_category(&mut self, id: &str, name: &str) -> Result<()> {
        self.mutate(ChangeImpact::Ledger, |model| {
            CategoryService::rename(model, id, name)
        })
    }

    pub fn set_category_bank_name(&mut self, id: &str, bank_name: &str) -> Result<()> {
        self.mutate(ChangeImpact::Ledger, |model| {
            CategoryService::set_bank_name(model, id, bank_name)
        })
    }

    pub fn set_category_amount(&mut self, id: &str, amount: f64) -> Result<()> {
        self.mutate(ChangeImpact::Automation, |model| {
            CategoryService::set_amount(model, id, amount)
        })
    }

    /// Deletes a sub-category and its entries. Use
    /// [`CategoryService::has_entries`] first to warn the user.
    pub fn delete_category(&mut self, id: &str) -> Result<()> {
        self.mutate(ChangeImpact::Automation, |model| {
            CategoryService::delete(model, id).map(|_| ())
        })
    }

    pub fn add_entry(&mut self, category_id: &str, entry: Entry) -> Result<usize> {
        self.mutate(ChangeImpact::Ledger, |model| {
            EntryService::add(model, category_id, entry)
        })
    }

    pub fn remove_entry(&mut self, category_id: &str, index: usize) -> Result<Entry> {
        self.mutate(ChangeImpact::Ledger, |model| {
            EntryService::remove(model, category_id, index)
        })
    }

    /// Overwrites the active model with a snapshot received from the room.
    ///
    /// Returns false when the snapshot is for another month or is the echo of
    /// this session's own last write. The applied snapshot is saved locally but
    /// never scheduled back to the room.
    pub fn apply_remote_snapshot(&mut self, mut snapshot: MonthlyModel) -> Result<bool> {
        if snapshot.month != self.month() {
            return Ok(false);
        }
        let Some(link) = self.remote.as_mut() else {
            return Ok(false);
        };
        if link.sync.is_echo(&snapshot) {
            return Ok(false);
        }
        link.sync.begin_remote_apply();
        migrate_legacy_tags(&mut snapshot);
        ensure_main_categories_in_place(&mut snapshot);
        self.model = snapshot;
        let saved = self.persist();
        if let Some(link) = self.remote.as_mut() {
            link.sync.end_remote_apply();
        }
        saved?;
        info!(month = %self.month(), "remote snapshot applied");
        Ok(true)
    }

    /// Applies the newest snapshot waiting on the subscription, if any.
    pub fn poll_remote(&mut self) -> Result<bool> {
        let Some(link) = self.remote.as_ref() else {
            return Ok(false);
        };
        let month = self.model.month;
        let latest = link
            .subscription
            .try_iter()
            .filter(|snapshot| snapshot.month == month)
            .last();
        match latest {
            Some(snapshot) => self.apply_remote_snapshot(snapshot),
            None => Ok(false),
        }
    }

    /// Writes the pending local change to the room right away.
    pub fn flush_remote(&mut self) -> Result<bool> {
        match self.remote.as_mut() {
            Some(link) => link.sync.flush_now(link.remote.as_ref()),
            None => Ok(false),
        }
    }

    /// Writes the pending local change once its debounce has elapsed.
    pub fn flush_remote_if_due(&mut self) -> Result<bool> {
        match self.remote.as_mut() {
            Some(link) => link.sync.flush_due(link.remote.as_ref()),
            None => Ok(false),
        }
    }

    fn mutate<T>(
        &mut self,
        impact: ChangeImpact,
        change: impl FnOnce(&mut MonthlyModel) -> Result<T>,
    ) -> Result<T> {
        let value = change(&mut self.model)?;
        if impact.needs_automation() {
            self.automate();
        }
        self.persist()?;
        Ok(value)
    }

    fn load_active(&mut self, month: MonthKey) -> Result<()> {
        let report = self.repository.load(month)?;
        for warning in &report.warnings {
            warn!(%month, "{warning}");
        }
        self.notes = report
            .warnings
            .into_iter()
            .chain(report.migrations)
            .collect();
        self.model = report.model;
        self.refresh_automations()
    }

    fn automate(&mut self) {
        let month = self.model.month;
        let current = std::mem::replace(&mut self.model, MonthlyModel::empty(month));
        self.model = apply_automations_with(current, month, &self.schedule);
    }

    fn persist(&mut self) -> Result<()> {
        self.repository.save(&self.model)?;
        self.schedule_remote();
        Ok(())
    }

    fn schedule_remote(&mut self) {
        if let Some(link) = self.remote.as_mut() {
            link.sync.schedule(&self.model);
        }
    }
}
