use std::{sync::Arc, time::Duration};

use sea_orm::DatabaseConnection;

use crate::{Clock, ResultEngine, RetryPolicy, SystemClock, locks::CampaignLocks};

mod access;
mod brands;
mod campaigns;
mod queries;
mod spend;
mod sweeps;

pub use queries::{BrandSummary, CampaignView, SpendEntryFilter, SpendEntryView, StatusSummary};
pub use spend::SpendOutcome;
pub use sweeps::SweepReport;

/// Default bound on waiting for a campaign held by another writer.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    clock: Arc<dyn Clock>,
    locks: CampaignLocks,
    lock_timeout: Duration,
    retry: RetryPolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The time source every dated decision is taken against.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    clock: Option<Arc<dyn Clock>>,
    lock_timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the wall clock (defaults to [`SystemClock`] in the host zone).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> EngineBuilder {
        self.clock = Some(clock);
        self
    }

    /// How long a writer waits for a busy campaign before giving up.
    pub fn lock_timeout(mut self, timeout: Duration) -> EngineBuilder {
        self.lock_timeout = Some(timeout);
        self
    }

    /// How transient failures of a spend are retried.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> EngineBuilder {
        self.retry = Some(retry);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(SystemClock::default())),
            locks: CampaignLocks::default(),
            lock_timeout: self.lock_timeout.unwrap_or(DEFAULT_LOCK_TIMEOUT),
            retry: self.retry.unwrap_or_default(),
        })
    }
}
