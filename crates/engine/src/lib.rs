//! Budget enforcement engine.
//!
//! Tracks advertising spend against per-brand ceilings and keeps each
//! campaign's active flag in line with its budget and dayparting window.
//!
//! Entry points:
//!
//! - [`Engine::apply_spend`]: record one spend event, atomically.
//! - [`Engine::run_sweep`] (and the four named wrappers): reconcile every
//!   campaign against one policy axis or reset a counter.
//! - [`Scheduler`]: drive the sweeps on their cadences.
pub use brands::Brand;
pub use campaigns::Campaign;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{
    BrandSummary, CampaignView, Engine, EngineBuilder, SpendEntryFilter, SpendEntryView,
    SpendOutcome, StatusSummary, SweepReport,
};
pub use policy::{Budget, DaypartingWindow, SpendTotals};
pub use reconcile::{CampaignState, SweepKind, reconcile};
pub use retry::RetryPolicy;
pub use scheduler::{Scheduler, SchedulerConfig, next_day_boundary, next_month_boundary};
pub use spend_entries::SpendEntry;

mod brands;
mod campaigns;
mod clock;
mod error;
mod locks;
mod money;
mod ops;
pub mod policy;
mod reconcile;
mod retry;
mod scheduler;
mod spend_entries;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
