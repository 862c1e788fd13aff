use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{CreateTransactionCmd, DateRange, Engine, MoneyCents, TransactionKind};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

fn on(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

struct Fixture {
    account_id: uuid::Uuid,
    salary_id: uuid::Uuid,
    groceries_id: uuid::Uuid,
    rent_id: uuid::Uuid,
}

async fn seed(engine: &Engine, user: &str) -> Fixture {
    let account = engine
        .new_account("Checking", "EUR", None, user, at(2025, 1, 1))
        .await
        .unwrap();
    let salary = engine
        .new_category(
            "Salary",
            TransactionKind::Income,
            None,
            "#00aa00",
            None,
            user,
            at(2025, 1, 1),
        )
        .await
        .unwrap();
    let groceries = engine
        .new_category(
            "Groceries",
            TransactionKind::Expense,
            Some("🛒"),
            "#aa0000",
            None,
            user,
            at(2025, 1, 2),
        )
        .await
        .unwrap();
    let rent = engine
        .new_category(
            "Rent",
            TransactionKind::Expense,
            None,
            "#0000aa",
            None,
            user,
            at(2025, 1, 3),
        )
        .await
        .unwrap();
    Fixture {
        account_id: account.id,
        salary_id: salary.id,
        groceries_id: groceries.id,
        rent_id: rent.id,
    }
}

async fn record(
    engine: &Engine,
    fx: &Fixture,
    kind: TransactionKind,
    category: uuid::Uuid,
    amount: i64,
    occurred: NaiveDate,
    created: DateTime<Utc>,
) -> engine::TransactionView {
    engine
        .create_transaction(CreateTransactionCmd::new(
            "alice", kind, amount, occurred, category, fx.account_id, created,
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn stats_cover_the_current_month_up_to_today() {
    let (engine, _db) = engine_with_db().await;
    let fx = seed(&engine, "alice").await;

    // previous month, must not show in the monthly figures
    record(
        &engine,
        &fx,
        TransactionKind::Income,
        fx.salary_id,
        99_999,
        on(2026, 2, 20),
        at(2026, 2, 20),
    )
    .await;
    record(
        &engine,
        &fx,
        TransactionKind::Income,
        fx.salary_id,
        10_000,
        on(2026, 3, 1),
        at(2026, 3, 1),
    )
    .await;
    record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.groceries_id,
        4_000,
        on(2026, 3, 10),
        at(2026, 3, 10),
    )
    .await;
    // future-dated within the month, past today
    record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.rent_id,
        80_000,
        on(2026, 3, 28),
        at(2026, 3, 10),
    )
    .await;

    let stats = engine.stats("alice", on(2026, 3, 15)).await.unwrap();
    assert_eq!(stats.account_count, 1);
    assert_eq!(stats.category_count, 3);
    assert_eq!(stats.transaction_count, 4);
    assert_eq!(stats.monthly_income, MoneyCents::new(10_000));
    assert_eq!(stats.monthly_expense, MoneyCents::new(4_000));
    assert_eq!(stats.monthly_net, MoneyCents::new(6_000));
    // total balance ignores dates entirely
    assert_eq!(
        stats.total_balance,
        MoneyCents::new(99_999 + 10_000 - 4_000 - 80_000)
    );
}

#[tokio::test]
async fn monthly_reports_are_zero_filled_and_oldest_first() {
    let (engine, _db) = engine_with_db().await;
    let fx = seed(&engine, "alice").await;

    record(
        &engine,
        &fx,
        TransactionKind::Income,
        fx.salary_id,
        10_000,
        on(2025, 12, 5),
        at(2025, 12, 5),
    )
    .await;
    record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.groceries_id,
        2_500,
        on(2026, 2, 10),
        at(2026, 2, 10),
    )
    .await;

    let series = engine
        .monthly_reports("alice", 4, on(2026, 2, 14))
        .await
        .unwrap();
    let months: Vec<(i32, u32)> = series.iter().map(|r| (r.year, r.month)).collect();
    assert_eq!(months, vec![(2025, 11), (2025, 12), (2026, 1), (2026, 2)]);

    assert_eq!(series[0].transaction_count, 0);
    assert_eq!(series[0].net, MoneyCents::ZERO);

    assert_eq!(series[1].total_income, MoneyCents::new(10_000));
    assert_eq!(series[1].net, MoneyCents::new(10_000));

    assert_eq!(series[3].total_expense, MoneyCents::new(2_500));
    assert_eq!(series[3].net, MoneyCents::new(-2_500));
}

#[tokio::test]
async fn category_analysis_orders_by_total_and_shares_the_grand_total() {
    let (engine, _db) = engine_with_db().await;
    let fx = seed(&engine, "alice").await;

    record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.groceries_id,
        3_000,
        on(2026, 3, 5),
        at(2026, 3, 5),
    )
    .await;
    record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.rent_id,
        7_000,
        on(2026, 3, 1),
        at(2026, 3, 1),
    )
    .await;
    // income must not leak into an expense breakdown
    record(
        &engine,
        &fx,
        TransactionKind::Income,
        fx.salary_id,
        50_000,
        on(2026, 3, 1),
        at(2026, 3, 1),
    )
    .await;

    let slices = engine
        .category_analysis("alice", TransactionKind::Expense, &DateRange::open(), None)
        .await
        .unwrap();
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].name, "Rent");
    assert_eq!(slices[0].total, MoneyCents::new(7_000));
    assert_eq!(slices[0].percentage, 70.0);
    assert_eq!(slices[1].name, "Groceries");
    assert_eq!(slices[1].icon, "🛒");
    assert_eq!(slices[1].percentage, 30.0);

    // truncation keeps the full-set percentages
    let top = engine
        .category_analysis(
            "alice",
            TransactionKind::Expense,
            &DateRange::open(),
            Some(1),
        )
        .await
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].percentage, 70.0);
}

#[tokio::test]
async fn category_analysis_respects_the_date_window() {
    let (engine, _db) = engine_with_db().await;
    let fx = seed(&engine, "alice").await;

    record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.groceries_id,
        1_000,
        on(2026, 1, 15),
        at(2026, 1, 15),
    )
    .await;
    record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.groceries_id,
        2_000,
        on(2026, 3, 15),
        at(2026, 3, 15),
    )
    .await;

    let range = DateRange::last_30_days(on(2026, 3, 20));
    let slices = engine
        .category_analysis("alice", TransactionKind::Expense, &range, None)
        .await
        .unwrap();
    assert_eq!(slices.len(), 1);
    assert_eq!(slices[0].total, MoneyCents::new(2_000));
    assert_eq!(slices[0].transaction_count, 1);
    assert_eq!(slices[0].percentage, 100.0);

    let empty = engine
        .category_analysis(
            "alice",
            TransactionKind::Expense,
            &DateRange::last_30_days(on(2024, 6, 1)),
            None,
        )
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn recent_transactions_break_same_day_ties_by_creation_instant() {
    let (engine, _db) = engine_with_db().await;
    let fx = seed(&engine, "alice").await;

    let first = record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.groceries_id,
        1_000,
        on(2026, 3, 10),
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
    )
    .await;
    let second = record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.groceries_id,
        2_000,
        on(2026, 3, 10),
        Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap(),
    )
    .await;
    let older_day = record(
        &engine,
        &fx,
        TransactionKind::Income,
        fx.salary_id,
        5_000,
        on(2026, 3, 1),
        Utc.with_ymd_and_hms(2026, 3, 12, 8, 0, 0).unwrap(),
    )
    .await;

    let recent = engine.recent_transactions("alice", 2).await.unwrap();
    let ids: Vec<uuid::Uuid> = recent.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let all = engine.recent_transactions("alice", 10).await.unwrap();
    assert_eq!(all.last().map(|t| t.id), Some(older_day.id));
}

#[tokio::test]
async fn totals_by_kind_respect_the_date_window() {
    let (engine, _db) = engine_with_db().await;
    let fx = seed(&engine, "alice").await;

    record(
        &engine,
        &fx,
        TransactionKind::Income,
        fx.salary_id,
        10_000,
        on(2026, 1, 10),
        at(2026, 1, 10),
    )
    .await;
    record(
        &engine,
        &fx,
        TransactionKind::Income,
        fx.salary_id,
        12_000,
        on(2026, 3, 10),
        at(2026, 3, 10),
    )
    .await;
    let dropped = record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.groceries_id,
        4_000,
        on(2026, 3, 12),
        at(2026, 3, 12),
    )
    .await;
    record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.rent_id,
        70_000,
        on(2026, 3, 1),
        at(2026, 3, 1),
    )
    .await;
    engine
        .delete_transaction(dropped.id, "alice", at(2026, 3, 13))
        .await
        .unwrap();

    let income = engine
        .total_by_kind("alice", TransactionKind::Income, &DateRange::open())
        .await
        .unwrap();
    assert_eq!(income, MoneyCents::new(22_000));

    // tombstoned expense stays out, and the total is unsigned
    let expense = engine
        .total_by_kind("alice", TransactionKind::Expense, &DateRange::open())
        .await
        .unwrap();
    assert_eq!(expense, MoneyCents::new(70_000));

    let windowed = engine
        .total_by_kind(
            "alice",
            TransactionKind::Income,
            &DateRange {
                start: Some(on(2026, 3, 1)),
                end: Some(on(2026, 3, 31)),
            },
        )
        .await
        .unwrap();
    assert_eq!(windowed, MoneyCents::new(12_000));

    let nothing = engine
        .total_by_kind(
            "alice",
            TransactionKind::Income,
            &DateRange::last_30_days(on(2024, 6, 1)),
        )
        .await
        .unwrap();
    assert_eq!(nothing, MoneyCents::ZERO);
}

#[tokio::test]
async fn reports_exclude_tombstoned_transactions() {
    let (engine, _db) = engine_with_db().await;
    let fx = seed(&engine, "alice").await;

    let kept = record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.groceries_id,
        2_000,
        on(2026, 3, 5),
        at(2026, 3, 5),
    )
    .await;
    let dropped = record(
        &engine,
        &fx,
        TransactionKind::Expense,
        fx.rent_id,
        9_000,
        on(2026, 3, 6),
        at(2026, 3, 6),
    )
    .await;
    engine
        .delete_transaction(dropped.id, "alice", at(2026, 3, 7))
        .await
        .unwrap();

    let stats = engine.stats("alice", on(2026, 3, 15)).await.unwrap();
    assert_eq!(stats.transaction_count, 1);
    assert_eq!(stats.monthly_expense, MoneyCents::new(2_000));

    let slices = engine
        .category_analysis("alice", TransactionKind::Expense, &DateRange::open(), None)
        .await
        .unwrap();
    assert_eq!(slices.len(), 1);
    assert_eq!(slices[0].name, "Groceries");
    assert_eq!(slices[0].percentage, 100.0);

    let recent = engine.recent_transactions("alice", 10).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, kept.id);
}
