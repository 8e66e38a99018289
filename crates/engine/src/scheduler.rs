//! Background driver for the reconciliation sweeps.
//!
//! Budget and dayparting sweeps run on fixed intervals. The two resets wait
//! for the next local day or month boundary as seen by the engine's clock,
//! and run at most once per day or month.
use std::{sync::Arc, time::Duration};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tokio::{
    task::JoinSet,
    time::{MissedTickBehavior, interval, sleep},
};

use crate::{Engine, SweepKind};

/// Slack added after a boundary so the clock is safely past it on wake-up.
const BOUNDARY_GRACE: Duration = Duration::from_secs(1);

/// Cadences of the four sweeps. `None` / `false` disables a loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub budget_interval: Option<Duration>,
    pub dayparting_interval: Option<Duration>,
    pub daily_reset: bool,
    pub monthly_reset: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            budget_interval: Some(Duration::from_secs(60)),
            dayparting_interval: Some(Duration::from_secs(60)),
            daily_reset: true,
            monthly_reset: true,
        }
    }
}

#[derive(Debug)]
pub struct Scheduler {
    engine: Arc<Engine>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(engine: Arc<Engine>, config: SchedulerConfig) -> Self {
        Self { engine, config }
    }

    /// Start every enabled loop. Dropping or aborting the returned set stops them.
    pub fn spawn(self) -> JoinSet<()> {
        let mut tasks = JoinSet::new();

        if let Some(period) = self.config.budget_interval {
            tasks.spawn(periodic(self.engine.clone(), SweepKind::Budget, period));
        }
        if let Some(period) = self.config.dayparting_interval {
            tasks.spawn(periodic(
                self.engine.clone(),
                SweepKind::Dayparting,
                period,
            ));
        }
        if self.config.daily_reset {
            tasks.spawn(on_boundary(
                self.engine.clone(),
                SweepKind::DailyReset,
                next_day_boundary,
            ));
        }
        if self.config.monthly_reset {
            tasks.spawn(on_boundary(
                self.engine.clone(),
                SweepKind::MonthlyReset,
                next_month_boundary,
            ));
        }

        tracing::info!(
            budget = ?self.config.budget_interval,
            dayparting = ?self.config.dayparting_interval,
            daily_reset = self.config.daily_reset,
            monthly_reset = self.config.monthly_reset,
            "scheduler started"
        );
        tasks
    }
}

/// Run `kind` every `period`. A sweep overrunning its period swallows the
/// ticks it missed instead of running back to back.
async fn periodic(engine: Arc<Engine>, kind: SweepKind, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        if let Err(err) = engine.run_sweep(kind).await {
            tracing::error!(%kind, "sweep failed: {err}");
        }
    }
}

/// Run `kind` once each time the clock crosses the boundary computed by `next`.
async fn on_boundary(
    engine: Arc<Engine>,
    kind: SweepKind,
    next: fn(NaiveDateTime) -> Option<NaiveDateTime>,
) {
    let mut last_run: Option<NaiveDate> = None;
    loop {
        let now = engine.clock().now();
        let Some(boundary) = next(now) else {
            tracing::error!(%kind, "no boundary after {now}, stopping");
            return;
        };
        let wait = (boundary - now).to_std().unwrap_or_default() + BOUNDARY_GRACE;
        tracing::debug!(%kind, %boundary, "waiting {wait:?}");
        sleep(wait).await;

        let now = engine.clock().now();
        // Woke early (host clock adjusted or zone changed): compute again.
        if now < boundary {
            continue;
        }
        let period = period_key(kind, now.date());
        if last_run == Some(period) {
            continue;
        }
        if let Err(err) = engine.run_sweep(kind).await {
            tracing::error!(%kind, "sweep failed: {err}");
        }
        last_run = Some(period);
    }
}

/// Identify the day or month a reset belongs to.
fn period_key(kind: SweepKind, date: NaiveDate) -> NaiveDate {
    match kind {
        SweepKind::MonthlyReset => date.with_day(1).unwrap_or(date),
        _ => date,
    }
}

/// Next local midnight strictly after `now`.
pub fn next_day_boundary(now: NaiveDateTime) -> Option<NaiveDateTime> {
    now.date().succ_opt()?.and_hms_opt(0, 0, 0)
}

/// 00:00 on the first day of the month following `now`.
pub fn next_month_boundary(now: NaiveDateTime) -> Option<NaiveDateTime> {
    let (year, month) = match now.month() {
        12 => (now.year() + 1, 1),
        month => (now.year(), month + 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}
