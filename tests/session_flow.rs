mod common;

use common::{date, json_store, month, setup_session, temp_base};
use household_budget::{
    core::{AutomationSchedule, BudgetSession},
    domain::{Entry, EntryKind, GroupKind, ModelTemplate},
    errors::BudgetError,
    storage::{KeyValueStore, ModelRepository},
};

#[test]
fn month_flow_keeps_automation_in_step_with_edits() {
    let (mut session, _base) = setup_session("2025-08");
    session.set_group_pool("salary", 3_000_000.0).unwrap();
    session.set_category_amount("living", 500_000.0).unwrap();
    session.set_category_amount("food", 300_000.0).unwrap();
    session
        .add_entry(
            "food",
            Entry::manual(date(2025, 8, 3), 9_000.0, EntryKind::Expense, "lunch"),
        )
        .unwrap();

    let model = session.model();
    assert_eq!(model.entries_for("main_salary").len(), 3);
    assert_eq!(model.entries_for("food").len(), 2);

    session.set_category_amount("food", 0.0).unwrap();
    let food = session.model().entries_for("food");
    assert_eq!(food.len(), 1);
    assert_eq!(food[0].memo, "lunch");
}

#[test]
fn state_survives_reopening_the_store() {
    let (mut session, base) = setup_session("2025-08");
    let group_id = session.create_group("Travel", GroupKind::Generic).unwrap();
    let category_id = session
        .create_category(&group_id, "Flights", " Hana Bank ")
        .unwrap();
    session.set_category_amount(&category_id, 120_000.0).unwrap();
    let expected = session.model().clone();
    drop(session);

    let repository = ModelRepository::new(json_store(&base), ModelTemplate::default());
    let reopened =
        BudgetSession::open(repository, AutomationSchedule::default(), month("2025-08")).unwrap();
    assert_eq!(reopened.model(), &expected);
    let category = reopened.model().category(&category_id).unwrap();
    assert_eq!(category.bank_name, "Hana Bank");
    assert!(reopened.load_notes().is_empty());
}

#[test]
fn group_rename_follows_through_to_main_category() {
    let (mut session, _base) = setup_session("2025-08");
    session.rename_group("savings", "Kids").unwrap();
    assert_eq!(
        session.model().main_category("savings").unwrap().name,
        "Kids (메인)"
    );
    let err = session.rename_category("main_savings", "Other").unwrap_err();
    assert!(matches!(err, BudgetError::MainCategoryProtected(_)));
}

#[test]
fn toggling_a_group_to_salary_credits_its_pool() {
    let (mut session, _base) = setup_session("2025-08");
    session.set_group_pool("savings", 100_000.0).unwrap();
    assert!(session.model().entries_for("main_savings").is_empty());
    assert_eq!(session.toggle_group_kind("savings").unwrap(), GroupKind::Salary);
    assert_eq!(session.model().entries_for("main_savings").len(), 1);
}

#[test]
fn invalid_mutations_are_rejected_without_side_effects() {
    let (mut session, _base) = setup_session("2025-08");
    let before = session.model().clone();
    assert!(matches!(
        session.create_group("   ", GroupKind::Generic),
        Err(BudgetError::InvalidInput(_))
    ));
    assert!(matches!(
        session.create_category("nope", "Food", ""),
        Err(BudgetError::GroupNotFound(_))
    ));
    assert!(matches!(
        session.remove_entry("food", 0),
        Err(BudgetError::EntryNotFound { index: 0, .. })
    ));
    assert_eq!(session.model(), &before);
}

#[test]
fn malformed_record_is_replaced_by_a_fresh_month() {
    let base = temp_base();
    let store = json_store(&base);
    store.set("budget-2025-08", "{ definitely not json").unwrap();

    let repository = ModelRepository::new(store, ModelTemplate::default());
    let session =
        BudgetSession::open(repository, AutomationSchedule::default(), month("2025-08")).unwrap();
    assert_eq!(session.model().groups.len(), 2);
    assert_eq!(session.load_notes().len(), 1);

    let rewritten = json_store(&base).get("budget-2025-08").unwrap().unwrap();
    assert!(rewritten.contains("\"month\": \"2025-08\""));
}

#[test]
fn months_are_independent_records() {
    let (mut session, _base) = setup_session("2025-08");
    session.set_group_pool("salary", 1_000.0).unwrap();
    session.switch_month(month("2025-09")).unwrap();
    assert_eq!(session.model().group("salary").unwrap().pool, 0.0);
    assert_eq!(
        session.repository().months().unwrap(),
        vec![month("2025-08"), month("2025-09")]
    );
}

#[test]
fn entry_with_blank_date_does_not_reset_the_month() {
    let base = temp_base();
    let store = json_store(&base);
    store
        .set(
            "budget-2025-08",
            r#"{"month":"2025-08",
                "groups":[{"id":"g2","name":"Travel","type":"generic","pool":0}],
                "categories":[{"id":"trip","name":"Flights","groupId":"g2","amount":0}],
                "entries":{"trip":[
                    {"date":"","amount":1000,"type":"expense","memo":"blank"},
                    {"date":"2025-08-04","amount":2000,"type":"expense","memo":"kept"}
                ]}}"#,
        )
        .unwrap();

    let repository = ModelRepository::new(store, ModelTemplate::default());
    let session =
        BudgetSession::open(repository, AutomationSchedule::default(), month("2025-08")).unwrap();
    assert!(session.model().group("g2").is_some());
    assert_eq!(session.model().entries_for("trip").len(), 1);
    assert!(session
        .load_notes()
        .iter()
        .any(|note| note.contains("budget-2025-08.rejected")));

    let stored = json_store(&base).get("budget-2025-08").unwrap().unwrap();
    assert!(stored.contains("\"trip\""));
    assert!(stored.contains("kept"));
    assert!(json_store(&base)
        .get("budget-2025-08.rejected")
        .unwrap()
        .unwrap()
        .contains("blank"));
}
