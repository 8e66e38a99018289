//! Handles settings for the service. Configuration is read from an optional
//! `settings.toml` and from `SPENDCAP__*` environment variables, e.g.
//! `SPENDCAP__ENGINE__TIMEZONE=Europe/Rome`.
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use engine::{RetryPolicy, SchedulerConfig, SystemClock};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("spendcap.db".to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Engine {
    pub lock_timeout_ms: u64,
    pub retry_attempts: usize,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// IANA zone for dayparting and entry dates. Host zone when unset.
    pub timezone: Option<String>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 2000,
            retry_attempts: 3,
            retry_base_delay_ms: 20,
            retry_max_delay_ms: 500,
            timezone: None,
        }
    }
}

impl Engine {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }

    pub fn clock(&self) -> Result<SystemClock, String> {
        match &self.timezone {
            Some(name) => SystemClock::with_timezone_name(name),
            None => Ok(SystemClock::default()),
        }
    }
}

/// Sweep cadences. An interval of `0` disables that sweep.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Scheduler {
    pub budget_interval_secs: u64,
    pub dayparting_interval_secs: u64,
    pub daily_reset: bool,
    pub monthly_reset: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            budget_interval_secs: 60,
            dayparting_interval_secs: 60,
            daily_reset: true,
            monthly_reset: true,
        }
    }
}

impl Scheduler {
    pub fn config(&self) -> SchedulerConfig {
        let every = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        SchedulerConfig {
            budget_interval: every(self.budget_interval_secs),
            dayparting_interval: every(self.dayparting_interval_secs),
            daily_reset: self.daily_reset,
            monthly_reset: self.monthly_reset,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub engine: Engine,
    pub scheduler: Scheduler,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("SPENDCAP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
