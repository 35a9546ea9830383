use std::sync::{Arc, Mutex};

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Engine, EngineError, EntryKind, InviteNotification, InviteNotifier, MoneyCents, NotifyError,
    Transfer, balances, settlement,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    for (id, email, name) in [
        ("alice", "alice@example.com", "Alice"),
        ("bob", "bob@example.com", "Bob"),
        ("carol", "carol@example.com", "Carol"),
        ("dave", "dave@example.com", "Dave"),
    ] {
        seed_user(&db, id, email, name).await;
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn seed_user(db: &DatabaseConnection, id: &str, email: &str, name: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (id, email, display_name) VALUES (?, ?, ?)",
        vec![id.into(), email.into(), name.into()],
    ))
    .await
    .unwrap();
}

/// Group with alice, bob and carol as members, created by alice.
async fn trio_group(engine: &Engine) -> Uuid {
    let group = engine.create_group("Trip", "alice").await.unwrap();
    engine
        .add_member_by_email(group.id, "bob@example.com", "alice")
        .await
        .unwrap();
    engine
        .add_member_by_email(group.id, "carol@example.com", "alice")
        .await
        .unwrap();
    group.id
}

fn cents(v: i64) -> MoneyCents {
    MoneyCents::new(v)
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<InviteNotification>>,
    fail: bool,
}

impl InviteNotifier for RecordingNotifier {
    fn notify(&self, invite: &InviteNotification) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError("smtp unreachable".to_string()));
        }
        self.sent.lock().unwrap().push(invite.clone());
        Ok(())
    }
}

#[tokio::test]
async fn create_group_has_creator_as_only_member() {
    let (engine, _db) = engine_with_db().await;

    let group = engine.create_group("  Flat 12 ", "alice").await.unwrap();

    assert_eq!(group.name, "Flat 12");
    assert_eq!(group.created_by, "alice");
    assert_eq!(
        group.members.iter().cloned().collect::<Vec<_>>(),
        vec!["alice".to_string()]
    );

    let listed = engine.list_groups_for_member("alice").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, group.id);
}

#[tokio::test]
async fn create_group_rejects_blank_name_and_unknown_creator() {
    let (engine, _db) = engine_with_db().await;

    assert!(matches!(
        engine.create_group("   ", "alice").await,
        Err(EngineError::InvalidInput(_))
    ));
    assert_eq!(
        engine.create_group("Trip", "nobody").await.unwrap_err(),
        EngineError::NotFound("nobody".to_string())
    );
}

#[tokio::test]
async fn add_member_is_idempotent() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;

    let again = engine
        .add_member_by_email(group_id, "bob@example.com", "alice")
        .await
        .unwrap();

    assert_eq!(again.members.len(), 3);
    assert!(again.members.contains("bob"));
}

#[tokio::test]
async fn add_member_unknown_email_fails() {
    let (engine, _db) = engine_with_db().await;
    let group = engine.create_group("Trip", "alice").await.unwrap();

    assert_eq!(
        engine
            .add_member_by_email(group.id, "ghost@example.com", "alice")
            .await
            .unwrap_err(),
        EngineError::NotFound("ghost@example.com".to_string())
    );
}

#[tokio::test]
async fn add_member_requires_inviter_membership() {
    let (engine, _db) = engine_with_db().await;
    let group = engine.create_group("Trip", "alice").await.unwrap();

    assert_eq!(
        engine
            .add_member_by_email(group.id, "carol@example.com", "bob")
            .await
            .unwrap_err(),
        EngineError::UnknownMember("bob".to_string())
    );
}

#[tokio::test]
async fn new_member_triggers_invite_notification() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    seed_user(&db, "alice", "alice@example.com", "Alice").await;
    seed_user(&db, "bob", "bob@example.com", "Bob").await;

    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Engine::builder()
        .database(db)
        .notifier(notifier.clone())
        .join_link_base("https://split.test")
        .build()
        .await
        .unwrap();

    let group = engine.create_group("Trip", "alice").await.unwrap();
    engine
        .add_member_by_email(group.id, "bob@example.com", "alice")
        .await
        .unwrap();
    // Re-adding must not notify again.
    engine
        .add_member_by_email(group.id, "bob@example.com", "alice")
        .await
        .unwrap();

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "bob@example.com");
    assert_eq!(sent[0].inviter_name, "Alice");
    assert_eq!(sent[0].group_name, "Trip");
    assert_eq!(sent[0].join_link, format!("https://split.test/groups/{}", group.id));
}

#[tokio::test]
async fn notification_failure_keeps_membership() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    seed_user(&db, "alice", "alice@example.com", "Alice").await;
    seed_user(&db, "bob", "bob@example.com", "Bob").await;

    let notifier = Arc::new(RecordingNotifier {
        fail: true,
        ..Default::default()
    });
    let engine = Engine::builder()
        .database(db)
        .notifier(notifier)
        .build()
        .await
        .unwrap();

    let group = engine.create_group("Trip", "alice").await.unwrap();
    let group = engine
        .add_member_by_email(group.id, "bob@example.com", "alice")
        .await
        .unwrap();

    assert!(group.members.contains("bob"));
    let reread = engine.group(group.id, "bob").await.unwrap();
    assert!(reread.members.contains("bob"));
}

#[tokio::test]
async fn expense_splits_evenly_with_residual_to_payer() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;

    engine
        .record_expense(
            group_id,
            cents(10_000),
            "Groceries",
            Some("Food"),
            "alice",
            &["alice".into(), "bob".into(), "carol".into()],
            "alice",
        )
        .await
        .unwrap();

    let balances = engine.balances(group_id, "alice").await.unwrap();
    assert_eq!(balances["alice"], cents(6_666));
    assert_eq!(balances["bob"], cents(-3_333));
    assert_eq!(balances["carol"], cents(-3_333));
    assert_eq!(
        balances.values().copied().fold(MoneyCents::ZERO, |a, b| a + b),
        MoneyCents::ZERO
    );
}

#[tokio::test]
async fn payer_outside_split_owes_nothing() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;

    engine
        .record_expense(
            group_id,
            cents(5_000),
            "Taxi",
            None,
            "alice",
            &["bob".into(), "carol".into()],
            "alice",
        )
        .await
        .unwrap();

    let balances = engine.balances(group_id, "alice").await.unwrap();
    assert_eq!(balances["alice"], cents(5_000));
    assert_eq!(balances["bob"], cents(-2_500));
    assert_eq!(balances["carol"], cents(-2_500));
}

#[tokio::test]
async fn settlement_shifts_balances_exactly() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;

    engine
        .record_expense(
            group_id,
            cents(9_000),
            "Dinner",
            Some("Food"),
            "alice",
            &["alice".into(), "bob".into(), "carol".into()],
            "alice",
        )
        .await
        .unwrap();
    engine
        .record_settlement(group_id, "bob", "alice", cents(3_000), "bob")
        .await
        .unwrap();

    let balances = engine.balances(group_id, "alice").await.unwrap();
    assert_eq!(balances["alice"], cents(3_000));
    assert_eq!(balances["bob"], MoneyCents::ZERO);
    assert_eq!(balances["carol"], cents(-3_000));

    let plan = settlement::plan(&balances);
    assert_eq!(
        plan,
        vec![Transfer {
            from: "carol".to_string(),
            to: "alice".to_string(),
            amount: cents(3_000),
        }]
    );
}

#[tokio::test]
async fn append_validation_errors() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;

    assert!(matches!(
        engine
            .record_expense(group_id, cents(0), "x", None, "alice", &["alice".into()], "alice")
            .await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine
            .record_expense(group_id, cents(100), "x", None, "alice", &[], "alice")
            .await,
        Err(EngineError::InvalidSplit(_))
    ));
    assert!(matches!(
        engine
            .record_expense(
                group_id,
                cents(100),
                "x",
                None,
                "alice",
                &["dave".into()],
                "alice"
            )
            .await,
        Err(EngineError::InvalidSplit(_))
    ));
    assert_eq!(
        engine
            .record_expense(
                group_id,
                cents(100),
                "x",
                None,
                "dave",
                &["alice".into()],
                "alice"
            )
            .await
            .unwrap_err(),
        EngineError::UnknownMember("dave".to_string())
    );
    assert_eq!(
        engine
            .record_settlement(group_id, "alice", "alice", cents(100), "alice")
            .await
            .unwrap_err(),
        EngineError::SelfSettlement("alice".to_string())
    );
    assert!(matches!(
        engine
            .record_settlement(Uuid::new_v4(), "alice", "bob", cents(100), "alice")
            .await,
        Err(EngineError::UnknownGroup(_))
    ));
}

#[tokio::test]
async fn oversized_amounts_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;

    // Repeated extreme expenses with the payer outside the split would
    // overflow the accumulated balances if they were ever admitted.
    for _ in 0..2 {
        assert!(matches!(
            engine
                .record_expense(
                    group_id,
                    cents(i64::MAX),
                    "Rounding error",
                    None,
                    "alice",
                    &["bob".into(), "carol".into()],
                    "alice",
                )
                .await,
            Err(EngineError::InvalidAmount(_))
        ));
    }
    assert!(matches!(
        engine
            .record_settlement(group_id, "bob", "alice", cents(i64::MAX), "bob")
            .await,
        Err(EngineError::InvalidAmount(_))
    ));

    // Nothing was appended; the maximum itself is still accepted.
    assert!(engine.list_entries(group_id, "alice").await.unwrap().is_empty());
    engine
        .record_expense(
            group_id,
            MoneyCents::MAX_AMOUNT,
            "Yacht",
            None,
            "alice",
            &["bob".into(), "carol".into()],
            "alice",
        )
        .await
        .unwrap();

    let balances = engine.balances(group_id, "alice").await.unwrap();
    assert_eq!(balances["alice"], MoneyCents::MAX_AMOUNT);
    assert_eq!(
        balances.values().copied().fold(MoneyCents::ZERO, |a, b| a + b),
        MoneyCents::ZERO
    );
}

#[tokio::test]
async fn expense_defaults_category_and_dedups_split() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;

    let entry = engine
        .record_expense(
            group_id,
            cents(600),
            "Coffee",
            Some("   "),
            "bob",
            &["bob".into(), "carol".into(), "bob".into()],
            "bob",
        )
        .await
        .unwrap();

    match &entry.kind {
        EntryKind::Expense {
            category,
            split_among,
            ..
        } => {
            assert_eq!(category, "Uncategorized");
            assert_eq!(split_among, &["bob".to_string(), "carol".to_string()]);
        }
        other => panic!("expected expense, got {other:?}"),
    }
}

#[tokio::test]
async fn list_entries_preserves_append_order() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;

    for (desc, amount) in [("One", 100), ("Two", 200), ("Three", 300)] {
        engine
            .record_expense(
                group_id,
                cents(amount),
                desc,
                None,
                "alice",
                &["alice".into(), "bob".into()],
                "alice",
            )
            .await
            .unwrap();
    }

    let entries = engine.list_entries(group_id, "bob").await.unwrap();
    let descriptions: Vec<_> = entries
        .iter()
        .map(|e| match &e.kind {
            EntryKind::Expense { description, .. } => description.clone(),
            EntryKind::Settlement { .. } => unreachable!(),
        })
        .collect();
    assert_eq!(descriptions, vec!["One", "Two", "Three"]);
}

#[tokio::test]
async fn list_entries_requires_membership() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;

    assert_eq!(
        engine.list_entries(group_id, "dave").await.unwrap_err(),
        EngineError::UnknownMember("dave".to_string())
    );
}

#[tokio::test]
async fn subscriber_receives_updates_with_fresh_balances() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;
    let mut rx = engine.subscribe(group_id);

    engine
        .record_expense(
            group_id,
            cents(9_000),
            "Dinner",
            None,
            "alice",
            &["alice".into(), "bob".into(), "carol".into()],
            "alice",
        )
        .await
        .unwrap();
    engine
        .record_settlement(group_id, "bob", "alice", cents(3_000), "bob")
        .await
        .unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first.group_id, group_id);
    assert_eq!(first.balances["alice"], cents(6_000));

    let second = rx.recv().await.unwrap();
    assert_eq!(second.balances["bob"], MoneyCents::ZERO);
    assert_eq!(second.balances["alice"], cents(3_000));
}

#[tokio::test]
async fn failed_append_publishes_nothing() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;
    let mut rx = engine.subscribe(group_id);

    engine
        .record_expense(group_id, cents(100), "x", None, "dave", &["alice".into()], "alice")
        .await
        .unwrap_err();

    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn snapshot_is_consistent() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;

    engine
        .record_expense(
            group_id,
            cents(9_000),
            "Dinner",
            Some("Food"),
            "alice",
            &["alice".into(), "bob".into(), "carol".into()],
            "alice",
        )
        .await
        .unwrap();

    let snapshot = engine.group_snapshot(group_id, "carol").await.unwrap();
    assert_eq!(snapshot.group.id, group_id);
    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(
        snapshot.balances,
        balances::compute(&snapshot.group.members, &snapshot.entries)
    );
    assert_eq!(snapshot.settlement_plan, settlement::plan(&snapshot.balances));
    assert!(snapshot.settlement_plan.len() <= 2);
}

#[tokio::test]
async fn totals_cover_expenses_only() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;

    engine
        .record_expense(
            group_id,
            cents(4_000),
            "Dinner",
            Some("Food"),
            "alice",
            &["alice".into(), "bob".into()],
            "alice",
        )
        .await
        .unwrap();
    engine
        .record_expense(
            group_id,
            cents(1_500),
            "Metro",
            Some("Transport"),
            "bob",
            &["alice".into(), "bob".into()],
            "bob",
        )
        .await
        .unwrap();
    engine
        .record_settlement(group_id, "bob", "alice", cents(500), "bob")
        .await
        .unwrap();

    let totals = engine.group_totals(group_id, "alice").await.unwrap();
    assert_eq!(totals.by_payer["alice"], cents(4_000));
    assert_eq!(totals.by_payer["bob"], cents(1_500));
    assert_eq!(totals.by_category["Food"], cents(4_000));
    assert_eq!(totals.by_category["Transport"], cents(1_500));
    assert!(!totals.by_category.contains_key("Settlement"));
}

#[tokio::test]
async fn export_rows_use_display_labels() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trio_group(&engine).await;

    engine
        .record_expense(
            group_id,
            cents(4_000),
            "Dinner",
            Some("Food"),
            "alice",
            &["alice".into(), "bob".into()],
            "alice",
        )
        .await
        .unwrap();
    engine
        .record_settlement(group_id, "bob", "alice", cents(2_000), "bob")
        .await
        .unwrap();

    let rows = engine.export_rows(group_id, "alice").await.unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].kind, "expense");
    assert_eq!(rows[0].paid_by, "Alice");
    assert_eq!(rows[0].participants, "Alice; Bob");
    assert_eq!(rows[0].amount, cents(4_000));

    assert_eq!(rows[1].kind, "settlement");
    assert_eq!(rows[1].paid_by, "Bob");
    assert_eq!(rows[1].participants, "Alice");
    assert_eq!(rows[1].category, "Settlement");
}
