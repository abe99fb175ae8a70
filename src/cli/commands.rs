use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use dialoguer::{theme::ColorfulTheme, Confirm};

use crate::config::{Config, ConfigManager, RemoteConfig};
use crate::core::services::{CategoryService, GroupService, SummaryService};
use crate::core::BudgetSession;
use crate::domain::{parse_amount, Entry, EntryKind, GroupKind, MonthKey, MonthlyModel};
use crate::errors::BudgetError;
use crate::storage::{
    export_bundle, read_bundle_from_path, restore_bundle, write_bundle_to_path, JsonDirStore,
    KeyValueStore, ModelRepository, REMOTE_CONFIG_KEY, ROOM_ID_KEY,
};
use crate::utils::{
    build_info,
    clock::{Clock, SystemClock},
    paths,
};

use super::{output, CliError};

const RECENT_ENTRY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Show { month: Option<MonthKey> },
    Day { date: NaiveDate },
    Automate { month: Option<MonthKey> },
    GroupAdd { name: String, kind: GroupKind },
    GroupRename { group_id: String, name: String },
    GroupToggle { group_id: String },
    GroupDelete { group_id: String },
    Pool { group_id: String, amount: f64 },
    CategoryAdd { group_id: String, name: String, bank_name: String },
    CategoryRename { category_id: String, name: String },
    Amount { category_id: String, amount: f64 },
    CategoryDelete { category_id: String },
    EntryAdd {
        category_id: String,
        date: NaiveDate,
        amount: f64,
        kind: EntryKind,
        memo: String,
    },
    EntryRemove { category_id: String, index: usize },
    Reset { month: Option<MonthKey> },
    Export { path: PathBuf },
    Import { path: PathBuf },
    Room { room_id: Option<String> },
    Version,
    Help,
}

/// A parsed command line: the command plus the global flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: Command,
    /// `--month YYYY-MM`; month-scoped commands default to the current month.
    pub month: Option<MonthKey>,
    /// `--yes`/`-y` skips confirmation prompts.
    pub assume_yes: bool,
}

impl Invocation {
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut positional = Vec::new();
        let mut month = None;
        let mut assume_yes = false;
        let mut salary = false;
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--yes" | "-y" => assume_yes = true,
                "--salary" => salary = true,
                "--month" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| usage("--month expects YYYY-MM"))?;
                    month = Some(parse_month(value)?);
                }
                _ => positional.push(arg.as_str()),
            }
        }

        let Some((name, rest)) = positional.split_first() else {
            return Ok(Self {
                command: Command::Help,
                month,
                assume_yes,
            });
        };
        let command = match (*name, rest) {
            ("show", [month]) => Command::Show {
                month: Some(parse_month(month)?),
            },
            ("show", []) => Command::Show { month: None },
            ("day", [date]) => Command::Day {
                date: parse_date(date)?,
            },
            ("automate", [month]) => Command::Automate {
                month: Some(parse_month(month)?),
            },
            ("automate", []) => Command::Automate { month: None },
            ("group-add", [name]) => Command::GroupAdd {
                name: name.to_string(),
                kind: if salary {
                    GroupKind::Salary
                } else {
                    GroupKind::Generic
                },
            },
            ("group-rename", [group_id, name]) => Command::GroupRename {
                group_id: group_id.to_string(),
                name: name.to_string(),
            },
            ("group-toggle", [group_id]) => Command::GroupToggle {
                group_id: group_id.to_string(),
            },
            ("group-delete", [group_id]) => Command::GroupDelete {
                group_id: group_id.to_string(),
            },
            ("pool", [group_id, amount]) => Command::Pool {
                group_id: group_id.to_string(),
                amount: parse_amount(amount),
            },
            ("category-add", [group_id, name, bank @ ..]) if bank.len() <= 1 => {
                Command::CategoryAdd {
                    group_id: group_id.to_string(),
                    name: name.to_string(),
                    bank_name: bank.first().map(|bank| bank.to_string()).unwrap_or_default(),
                }
            }
            ("category-rename", [category_id, name]) => Command::CategoryRename {
                category_id: category_id.to_string(),
                name: name.to_string(),
            },
            ("amount", [category_id, amount]) => Command::Amount {
                category_id: category_id.to_string(),
                amount: parse_amount(amount),
            },
            ("category-delete", [category_id]) => Command::CategoryDelete {
                category_id: category_id.to_string(),
            },
            ("entry-add", [category_id, date, amount, kind, memo @ ..]) => Command::EntryAdd {
                category_id: category_id.to_string(),
                date: parse_date(date)?,
                amount: parse_amount(amount),
                kind: kind.parse().map_err(|err: String| usage(&err))?,
                memo: memo.join(" "),
            },
            ("entry-remove", [category_id, index]) => Command::EntryRemove {
                category_id: category_id.to_string(),
                index: index
                    .parse()
                    .map_err(|_| usage(&format!("`{index}` is not an entry index")))?,
            },
            ("reset", [month]) => Command::Reset {
                month: Some(parse_month(month)?),
            },
            ("reset", []) => Command::Reset { month: None },
            ("export", [path]) => Command::Export {
                path: PathBuf::from(path),
            },
            ("import", [path]) => Command::Import {
                path: PathBuf::from(path),
            },
            ("room", [room_id]) => Command::Room {
                room_id: Some(room_id.to_string()),
            },
            ("room", []) => Command::Room { room_id: None },
            ("version", []) => Command::Version,
            ("help", _) => Command::Help,
            (other, _) => return Err(usage(&format!("unrecognised command `{other}`"))),
        };
        Ok(Self {
            command,
            month,
            assume_yes,
        })
    }
}

fn usage(message: &str) -> CliError {
    CliError::Usage(format!("{message}\n\n{}", usage_text()))
}

fn parse_month(raw: &str) -> Result<MonthKey, CliError> {
    MonthKey::parse(raw).map_err(|err| usage(&err.to_string()))
}

fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| usage(&format!("`{raw}` is not a YYYY-MM-DD date")))
}

pub fn usage_text() -> &'static str {
    "Usage: household_budget_cli [--month YYYY-MM] [--yes] <command>\n\
     Commands:\n  \
     show [YYYY-MM]\n  \
     day <YYYY-MM-DD>\n  \
     automate [YYYY-MM]\n  \
     group-add <name> [--salary]\n  \
     group-rename <groupId> <name>\n  \
     group-toggle <groupId>\n  \
     group-delete <groupId>\n  \
     pool <groupId> <amount>\n  \
     category-add <groupId> <name> [bank]\n  \
     category-rename <categoryId> <name>\n  \
     amount <categoryId> <amount>\n  \
     category-delete <categoryId>\n  \
     entry-add <categoryId> <YYYY-MM-DD> <amount> <income|expense> [memo]\n  \
     entry-remove <categoryId> <index>\n  \
     reset [YYYY-MM]\n  \
     export <file.json>\n  \
     import <file.json>\n  \
     room [roomId]\n  \
     version"
}

/// Data directory, configuration, and store resolved for one run.
struct Workspace {
    base: PathBuf,
    config_manager: ConfigManager,
    config: Config,
    store: JsonDirStore,
}

impl Workspace {
    fn open() -> Result<Self, CliError> {
        let base = paths::app_data_dir();
        let config_manager = ConfigManager::with_base_dir(&base)?;
        let config = config_manager.load()?;
        let store = JsonDirStore::new(config.resolve_data_dir(&base))?;
        Ok(Self {
            base,
            config_manager,
            config,
            store,
        })
    }

    fn session(&self, month: MonthKey) -> Result<BudgetSession<JsonDirStore>, CliError> {
        let repository = ModelRepository::new(self.store.clone(), self.config.template.clone());
        let session = BudgetSession::open(repository, self.config.schedule, month)?;
        for note in session.load_notes() {
            output::warning(note);
        }
        Ok(session)
    }
}

pub fn execute(invocation: Invocation) -> Result<(), CliError> {
    let Invocation {
        command,
        month,
        assume_yes,
    } = invocation;
    match command {
        Command::Help => {
            output::info(usage_text());
            return Ok(());
        }
        Command::Version => {
            output::info(build_info::current().summary());
            return Ok(());
        }
        _ => {}
    }

    let workspace = Workspace::open()?;
    let active = |explicit: Option<MonthKey>| {
        explicit
            .or(month)
            .unwrap_or_else(|| SystemClock.current_month())
    };

    match command {
        Command::Show { month } => {
            let session = workspace.session(active(month))?;
            print_month(session.model());
        }
        Command::Day { date } => {
            let session = workspace.session(MonthKey::from_date(date))?;
            let rows = SummaryService::entries_on(session.model(), date);
            output::section(format!("Entries on {date}"));
            if rows.is_empty() {
                output::info("No entries.");
            }
            for row in rows {
                output::info(format!(
                    "{}#{}  {:<7} {:>14}  {}",
                    row.category_id,
                    row.index,
                    row.entry.kind,
                    output::format_amount(row.entry.amount),
                    row.entry.memo
                ));
            }
        }
        Command::Automate { month } => {
            let mut session = workspace.session(active(month))?;
            session.refresh_automations()?;
            let generated = session
                .model()
                .all_entries()
                .filter(|(_, _, entry)| entry.is_automated())
                .count();
            output::success(format!(
                "Automations for {} applied ({generated} generated entries).",
                session.month()
            ));
        }
        Command::GroupAdd { name, kind } => {
            let mut session = workspace.session(active(None))?;
            let id = session.create_group(&name, kind)?;
            output::success(format!("Group `{id}` created ({kind})."));
        }
        Command::GroupRename { group_id, name } => {
            let mut session = workspace.session(active(None))?;
            session.rename_group(&group_id, &name)?;
            output::success(format!("Group `{group_id}` renamed."));
        }
        Command::GroupToggle { group_id } => {
            let mut session = workspace.session(active(None))?;
            let kind = session.toggle_group_kind(&group_id)?;
            output::success(format!("Group `{group_id}` is now {kind}."));
        }
        Command::GroupDelete { group_id } => {
            let mut session = workspace.session(active(None))?;
            if GroupService::has_sub_categories(session.model(), &group_id)
                && !confirm(
                    assume_yes,
                    &format!("Group `{group_id}` still has categories. Delete them too?"),
                )?
            {
                output::info("Cancelled.");
                return Ok(());
            }
            session.delete_group(&group_id)?;
            output::success(format!("Group `{group_id}` deleted."));
        }
        Command::Pool { group_id, amount } => {
            let mut session = workspace.session(active(None))?;
            session.set_group_pool(&group_id, amount)?;
            output::success(format!(
                "Pool of `{group_id}` set to {}.",
                output::format_amount(amount)
            ));
        }
        Command::CategoryAdd {
            group_id,
            name,
            bank_name,
        } => {
            let mut session = workspace.session(active(None))?;
            let id = session.create_category(&group_id, &name, &bank_name)?;
            output::success(format!("Category `{id}` created under `{group_id}`."));
        }
        Command::CategoryRename { category_id, name } => {
            let mut session = workspace.session(active(None))?;
            session.rename_category(&category_id, &name)?;
            output::success(format!("Category `{category_id}` renamed."));
        }
        Command::Amount {
            category_id,
            amount,
        } => {
            let mut session = workspace.session(active(None))?;
            session.set_category_amount(&category_id, amount)?;
            output::success(format!(
                "Allocation of `{category_id}` set to {}.",
                output::format_amount(amount)
            ));
        }
        Command::CategoryDelete { category_id } => {
            let mut session = workspace.session(active(None))?;
            if CategoryService::has_entries(session.model(), &category_id)
                && !confirm(
                    assume_yes,
                    &format!("Category `{category_id}` has entries. Delete it anyway?"),
                )?
            {
                output::info("Cancelled.");
                return Ok(());
            }
            session.delete_category(&category_id)?;
            output::success(format!("Category `{category_id}` deleted."));
        }
        Command::EntryAdd {
            category_id,
            date,
            amount,
            kind,
            memo,
        } => {
            let mut session = workspace.session(MonthKey::from_date(date))?;
            let index = session.add_entry(&category_id, Entry::manual(date, amount, kind, memo))?;
            output::success(format!("Entry {category_id}#{index} added."));
        }
        Command::EntryRemove { category_id, index } => {
            let mut session = workspace.session(active(None))?;
            let removed = session.remove_entry(&category_id, index)?;
            output::success(format!(
                "Removed {} {} from `{category_id}`.",
                removed.kind,
                output::format_amount(removed.amount)
            ));
        }
        Command::Reset { month } => {
            let month = active(month);
            if !confirm(
                assume_yes,
                &format!("Reset {month} to the default template? All entries are lost."),
            )? {
                output::info("Cancelled.");
                return Ok(());
            }
            let mut session = workspace.session(month)?;
            session.reset_month()?;
            output::success(format!("{month} reset."));
        }
        Command::Export { path } => {
            let bundle = export_bundle(&workspace.store, Utc::now())?;
            write_bundle_to_path(&bundle, &path)?;
            output::success(format!(
                "Exported {} records to {}.",
                bundle.items.len(),
                path.display()
            ));
        }
        Command::Import { path } => import(&workspace, &path, assume_yes)?,
        Command::Room { room_id } => room(workspace, room_id)?,
        Command::Help | Command::Version => {}
    }
    Ok(())
}

fn import(workspace: &Workspace, path: &Path, assume_yes: bool) -> Result<(), CliError> {
    let bundle = read_bundle_from_path(path)?;
    let mut prompt_error = None;
    let summary = restore_bundle(&workspace.store, &bundle, |key| {
        if prompt_error.is_some() {
            return false;
        }
        match confirm(assume_yes, &format!("`{key}` already exists. Overwrite?")) {
            Ok(answer) => answer,
            Err(err) => {
                prompt_error = Some(err);
                false
            }
        }
    })?;
    if let Some(err) = prompt_error {
        return Err(err);
    }
    output::success(format!(
        "Imported {} records ({} overwritten, {} skipped).",
        summary.total - summary.skipped,
        summary.overwritten,
        summary.skipped
    ));
    Ok(())
}

fn room(mut workspace: Workspace, room_id: Option<String>) -> Result<(), CliError> {
    let Some(room_id) = room_id else {
        match &workspace.config.remote {
            Some(remote) => output::info(format!(
                "Room `{}` (debounce {} ms)",
                remote.room_id, remote.debounce_ms
            )),
            None => output::info("No shared room configured."),
        }
        return Ok(());
    };
    let room_id = room_id.trim().to_string();
    if room_id.is_empty() {
        return Err(usage("room id must not be empty"));
    }
    let backup = workspace
        .config_manager
        .backup(&workspace.config, Some("before-room"))?;
    let remote = RemoteConfig::new(room_id.clone());
    let remote_json = serde_json::to_string(&remote).map_err(BudgetError::from)?;
    workspace.config.remote = Some(remote);
    workspace.config_manager.save(&workspace.config)?;
    workspace.store.set(ROOM_ID_KEY, &room_id)?;
    workspace.store.set(REMOTE_CONFIG_KEY, &remote_json)?;
    output::success(format!(
        "Room set to `{room_id}` (previous configuration kept as {backup} in {}).",
        paths::config_backup_dir_in(&workspace.base).display()
    ));
    Ok(())
}

fn confirm(assume_yes: bool, prompt: &str) -> Result<bool, CliError> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(CliError::from)
}

fn print_month(model: &MonthlyModel) {
    output::section(format!("Budget {}", model.month));
    for group in &model.groups {
        let Ok(summary) = SummaryService::group_summary(model, &group.id) else {
            continue;
        };
        output::info(format!(
            "{} [{}]  pool {}  allocated {}  unallocated {}",
            output::label(group),
            group.kind,
            output::format_amount(summary.pool),
            output::format_amount(summary.allocated),
            output::format_amount(summary.unallocated),
        ));
        let categories = model.main_category(&group.id).into_iter().chain(model.sub_categories(&group.id));
        for category in categories {
            let balance = SummaryService::category_balance(model, &category.id);
            let bank = if category.bank_name.is_empty() {
                String::new()
            } else {
                format!("  [{}]", category.bank_name)
            };
            output::info(format!(
                "  {:<32} target {:>12}  balance {:>12}{bank}",
                output::label(category),
                output::format_amount(category.amount),
                output::format_amount(balance.net),
            ));
        }
    }

    let recent = SummaryService::recent_entries(model, RECENT_ENTRY_LIMIT);
    if recent.is_empty() {
        return;
    }
    output::section("Recent entries");
    for row in recent {
        let marker = if row.entry.is_automated() { "auto" } else { "" };
        output::info(format!(
            "{}  {}#{}  {:<7} {:>12}  {} {marker}",
            row.entry.date,
            row.category_id,
            row.index,
            row.entry.kind,
            output::format_amount(row.entry.amount),
            row.entry.memo,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn empty_arguments_show_help() {
        assert_eq!(Invocation::parse(&[]).unwrap().command, Command::Help);
    }

    #[test]
    fn global_flags_are_collected_anywhere() {
        let invocation = Invocation::parse(&args("pool --month 2025-08 salary 3,000,000 -y")).unwrap();
        assert_eq!(invocation.month, MonthKey::parse("2025-08").ok());
        assert!(invocation.assume_yes);
        assert_eq!(
            invocation.command,
            Command::Pool {
                group_id: "salary".into(),
                amount: 3_000_000.0
            }
        );
    }

    #[test]
    fn entry_add_joins_memo_words() {
        let invocation =
            Invocation::parse(&args("entry-add food 2025-08-03 9000 expense team lunch")).unwrap();
        assert_eq!(
            invocation.command,
            Command::EntryAdd {
                category_id: "food".into(),
                date: NaiveDate::from_ymd_opt(2025, 8, 3).unwrap(),
                amount: 9_000.0,
                kind: EntryKind::Expense,
                memo: "team lunch".into(),
            }
        );
    }

    #[test]
    fn salary_flag_selects_group_kind() {
        let invocation = Invocation::parse(&args("group-add Bonus --salary")).unwrap();
        assert_eq!(
            invocation.command,
            Command::GroupAdd {
                name: "Bonus".into(),
                kind: GroupKind::Salary
            }
        );
    }

    #[test]
    fn bad_input_is_a_usage_error() {
        for line in ["frobnicate", "show 2025-13", "entry-add food 08/03 1 expense", "entry-remove food x"] {
            assert!(matches!(
                Invocation::parse(&args(line)),
                Err(CliError::Usage(_))
            ));
        }
    }
}
