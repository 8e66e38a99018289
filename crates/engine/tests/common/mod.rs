#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{DaypartingWindow, Engine, FixedClock, MoneyCents};
use migration::MigratorTrait;
use uuid::Uuid;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn units(value: i64) -> MoneyCents {
    MoneyCents::from_units(value)
}

/// A clock parked on 2026-10-19 at `hour:minute`.
pub fn clock_at(hour: u32, minute: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock::at(date(2026, 10, 19), hour, minute).unwrap())
}

/// A migrated in-memory database (one connection, shared by every clone).
pub async fn migrated_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn engine_with_db(clock: Arc<FixedClock>) -> (Engine, DatabaseConnection) {
    let db = migrated_db().await;
    let engine = Engine::builder()
        .database(db.clone())
        .clock(clock)
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// A brand with the given ceilings and one campaign under it.
pub async fn brand_with_campaign(
    engine: &Engine,
    daily: i64,
    monthly: i64,
    window: Option<DaypartingWindow>,
) -> (Uuid, Uuid) {
    let brand_id = engine
        .new_brand("Acme", units(daily), units(monthly))
        .await
        .unwrap();
    let campaign_id = engine
        .new_campaign(brand_id, "Autumn launch", window)
        .await
        .unwrap();
    (brand_id, campaign_id)
}

/// Overwrite a campaign's counters and flag, bypassing every check.
pub async fn force_state(
    db: &DatabaseConnection,
    campaign_id: Uuid,
    daily: i64,
    monthly: i64,
    is_active: bool,
) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE campaigns SET daily_spend = ?, monthly_spend = ?, is_active = ? WHERE id = ?",
        vec![
            units(daily).cents().into(),
            units(monthly).cents().into(),
            is_active.into(),
            campaign_id.to_string().into(),
        ],
    ))
    .await
    .unwrap();
}

/// Store a raw dayparting window, e.g. one the engine would refuse to create.
pub async fn force_window(db: &DatabaseConnection, campaign_id: Uuid, start: &str, end: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE campaigns SET dayparting_start = ?, dayparting_end = ? WHERE id = ?",
        vec![start.into(), end.into(), campaign_id.to_string().into()],
    ))
    .await
    .unwrap();
}
