use std::{sync::Arc, time::Duration};

use chrono::NaiveTime;
use engine::{Engine, EngineError, MoneyCents, RetryPolicy, SpendEntryFilter};
use sea_orm::{Database, TransactionTrait};
use uuid::Uuid;

mod common;
use common::{
    brand_with_campaign, clock_at, date, engine_with_db, force_state, migrated_db, units,
};

#[tokio::test]
async fn spend_up_to_the_daily_cap_then_refuse() {
    let (engine, _db) = engine_with_db(clock_at(12, 0)).await;
    let (_, campaign_id) = brand_with_campaign(&engine, 1000, 30_000, None).await;

    let outcome = engine.apply_spend(campaign_id, units(100)).await.unwrap();
    assert_eq!(outcome.new_daily_spend, units(100));
    assert_eq!(outcome.new_monthly_spend, units(100));
    assert!(outcome.is_active);

    let err = engine
        .apply_spend(campaign_id, units(950))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::BudgetExceeded(_)));
    let campaign = engine.campaign(campaign_id).await.unwrap();
    assert_eq!(campaign.daily_spend, units(100));
    assert!(campaign.is_active);

    let outcome = engine.apply_spend(campaign_id, units(900)).await.unwrap();
    assert_eq!(outcome.new_daily_spend, units(1000));
    assert!(!outcome.is_active);

    let err = engine
        .apply_spend(campaign_id, MoneyCents::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotActive(_)));
    assert_eq!(err.to_string(), "campaign is not active");
}

#[tokio::test]
async fn monthly_cap_is_enforced_independently() {
    let (engine, db) = engine_with_db(clock_at(12, 0)).await;
    let (_, campaign_id) = brand_with_campaign(&engine, 1000, 30_000, None).await;
    force_state(&db, campaign_id, 0, 29_950, true).await;

    let err = engine
        .apply_spend(campaign_id, units(100))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "spend would exceed budget limits");

    let outcome = engine.apply_spend(campaign_id, units(50)).await.unwrap();
    assert_eq!(outcome.new_monthly_spend, units(30_000));
    assert_eq!(outcome.new_daily_spend, units(50));
    assert!(!outcome.is_active);
}

#[tokio::test]
async fn rejected_spend_leaves_no_entry() {
    let (engine, _db) = engine_with_db(clock_at(12, 0)).await;
    let (_, campaign_id) = brand_with_campaign(&engine, 100, 1000, None).await;

    assert!(engine.apply_spend(campaign_id, units(101)).await.is_err());
    let entries = engine
        .spend_entries(&SpendEntryFilter::default())
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn non_positive_amounts_are_invalid() {
    let (engine, _db) = engine_with_db(clock_at(12, 0)).await;
    let (_, campaign_id) = brand_with_campaign(&engine, 1000, 30_000, None).await;

    for amount in [MoneyCents::ZERO, MoneyCents::new(-500)] {
        let err = engine.apply_spend(campaign_id, amount).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}

#[tokio::test]
async fn unknown_campaign_is_not_found() {
    let (engine, _db) = engine_with_db(clock_at(12, 0)).await;
    let err = engine
        .apply_spend(Uuid::new_v4(), units(10))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("campaign not exists".to_string())
    );
}

#[tokio::test]
async fn spend_is_not_checked_against_the_dayparting_window() {
    let (engine, _db) = engine_with_db(clock_at(23, 30)).await;
    let window = engine::DaypartingWindow::parse("10:00", "16:00").unwrap();
    let (_, campaign_id) = brand_with_campaign(&engine, 1000, 30_000, Some(window)).await;

    let outcome = engine.apply_spend(campaign_id, units(10)).await.unwrap();
    assert!(outcome.is_active);
}

#[tokio::test]
async fn entries_are_dated_by_the_engine_clock() {
    let clock = clock_at(23, 59);
    let (engine, _db) = engine_with_db(clock.clone()).await;
    let (_, campaign_id) = brand_with_campaign(&engine, 1000, 30_000, None).await;

    engine.apply_spend(campaign_id, units(10)).await.unwrap();
    clock.advance(chrono::Duration::minutes(2));
    engine.apply_spend(campaign_id, units(20)).await.unwrap();

    let entries = engine
        .spend_entries(&SpendEntryFilter::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].entry.date, date(2026, 10, 19));
    assert_eq!(entries[0].entry.amount, units(10));
    assert_eq!(entries[1].entry.date, date(2026, 10, 20));
    assert_eq!(
        entries[1].entry.recorded_at.time(),
        NaiveTime::from_hms_opt(0, 1, 0).unwrap()
    );
    assert_eq!(entries[1].campaign_name, "Autumn launch");
    assert_eq!(entries[1].brand_name, "Acme");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_spend_never_loses_updates() {
    let (engine, _db) = engine_with_db(clock_at(12, 0)).await;
    let engine = Arc::new(engine);
    // Room for exactly 7 spends of 100.
    let (_, campaign_id) = brand_with_campaign(&engine, 700, 30_000, None).await;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..12 {
        let engine = engine.clone();
        tasks.spawn(async move { engine.apply_spend(campaign_id, units(100)).await });
    }

    let mut accepted = 0;
    let mut exceeded = 0;
    let mut not_active = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => accepted += 1,
            Err(EngineError::BudgetExceeded(_)) => exceeded += 1,
            Err(EngineError::NotActive(_)) => not_active += 1,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(accepted, 7);
    assert_eq!(exceeded + not_active, 5);
    let campaign = engine.campaign(campaign_id).await.unwrap();
    assert_eq!(campaign.daily_spend, units(700));
    assert_eq!(campaign.monthly_spend, units(700));
    assert!(!campaign.is_active);

    let entries = engine
        .spend_entries(&engine::SpendEntryFilter {
            campaign_id: Some(campaign_id),
            date: None,
        })
        .await
        .unwrap();
    assert_eq!(entries.len(), 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_spend_with_headroom_left_refuses_the_rest_as_exceeded() {
    let (engine, _db) = engine_with_db(clock_at(12, 0)).await;
    let engine = Arc::new(engine);
    // 7 spends of 100 fit, the 8th would cross 750, and 700 stays below the cap.
    let (_, campaign_id) = brand_with_campaign(&engine, 750, 30_000, None).await;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..12 {
        let engine = engine.clone();
        tasks.spawn(async move { engine.apply_spend(campaign_id, units(100)).await });
    }

    let mut accepted = 0;
    let mut exceeded = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => accepted += 1,
            Err(EngineError::BudgetExceeded(_)) => exceeded += 1,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(accepted, 7);
    assert_eq!(exceeded, 5);
    let campaign = engine.campaign(campaign_id).await.unwrap();
    assert_eq!(campaign.daily_spend, units(700));
    assert!(campaign.is_active);
}

#[tokio::test]
async fn spend_on_a_busy_campaign_times_out() {
    let db = migrated_db().await;
    let engine = Arc::new(
        Engine::builder()
            .database(db.clone())
            .clock(clock_at(12, 0))
            .lock_timeout(Duration::from_millis(50))
            .retry_policy(RetryPolicy::no_retry())
            .build()
            .await
            .unwrap(),
    );
    let (_, campaign_id) = brand_with_campaign(&engine, 1000, 30_000, None).await;

    // Hold the only connection so the first spend parks inside its lock.
    let blocker = db.begin().await.unwrap();
    let first = tokio::spawn({
        let engine = engine.clone();
        async move { engine.apply_spend(campaign_id, units(10)).await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let err = engine
        .apply_spend(campaign_id, units(20))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::LockTimeout(campaign_id.to_string()));
    assert!(err.is_transient());

    blocker.rollback().await.unwrap();
    let outcome = first.await.unwrap().unwrap();
    assert_eq!(outcome.new_daily_spend, units(10));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn counters_never_exceed_budgets_under_contention() {
    let (engine, _db) = engine_with_db(clock_at(12, 0)).await;
    let engine = Arc::new(engine);
    let (_, campaign_id) = brand_with_campaign(&engine, 1000, 1500, None).await;

    let mut tasks = tokio::task::JoinSet::new();
    for amount in [300, 250, 400, 90, 10, 700, 120] {
        let engine = engine.clone();
        tasks.spawn(async move { engine.apply_spend(campaign_id, units(amount)).await });
    }
    let mut total = MoneyCents::ZERO;
    while let Some(result) = tasks.join_next().await {
        if let Ok(outcome) = result.unwrap() {
            total += outcome.amount;
        }
    }

    let campaign = engine.campaign(campaign_id).await.unwrap();
    assert_eq!(campaign.daily_spend, total);
    assert!(campaign.daily_spend <= units(1000));
    assert!(campaign.monthly_spend <= units(1500));
}

#[tokio::test]
async fn persistence_failures_are_not_retried() {
    // No schema: every statement fails.
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .clock(clock_at(12, 0))
        .retry_policy(RetryPolicy::new(
            5,
            Duration::from_millis(1),
            Duration::from_millis(1),
        ))
        .build()
        .await
        .unwrap();

    let err = engine
        .apply_spend(Uuid::new_v4(), units(10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));
    assert!(!err.is_transient());
}
