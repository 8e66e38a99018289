//! Activation policy.
//!
//! Pure decisions about whether a campaign should be active. Nothing here
//! touches the database: the spend applier and the reconciliation sweeps load
//! the numbers, ask the policy, and persist the answer.
//!
//! Two checks exist:
//!
//! - the **budget check** only ever deactivates (reaching a cap is enough);
//! - the **dayparting check** yields the target state: active iff the time of
//!   day is inside the window *and* both counters are strictly under budget.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine};

/// Daily and monthly ceilings of a brand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub daily: MoneyCents,
    pub monthly: MoneyCents,
}

/// Spend accumulated by a campaign since the last resets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendTotals {
    pub daily: MoneyCents,
    pub monthly: MoneyCents,
}

impl SpendTotals {
    /// Totals after adding `amount` to both counters, `None` on overflow.
    pub fn checked_add(self, amount: MoneyCents) -> Option<SpendTotals> {
        Some(SpendTotals {
            daily: self.daily.checked_add(amount)?,
            monthly: self.monthly.checked_add(amount)?,
        })
    }

    /// `true` when either counter has reached its cap.
    pub fn exhausts(&self, budget: &Budget) -> bool {
        self.daily >= budget.daily || self.monthly >= budget.monthly
    }

    /// `true` when either counter is strictly above its cap.
    pub fn exceeds(&self, budget: &Budget) -> bool {
        self.daily > budget.daily || self.monthly > budget.monthly
    }

    /// `true` when both counters are strictly under their caps.
    pub fn has_headroom(&self, budget: &Budget) -> bool {
        !self.exhausts(budget)
    }
}

/// Time-of-day interval in which a campaign may run.
///
/// Both ends are inclusive. Windows are same-day only: a window whose start is
/// after its end cannot be built, so overnight ranges are not expressible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaypartingWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl DaypartingWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> ResultEngine<Self> {
        if start > end {
            return Err(EngineError::InvalidWindow(format!(
                "start {} is after end {}",
                start.format("%H:%M"),
                end.format("%H:%M")
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse `HH:MM` (or `HH:MM:SS`) bounds.
    pub fn parse(start: &str, end: &str) -> ResultEngine<Self> {
        Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn contains(&self, now: NaiveTime) -> bool {
        self.start <= now && now <= self.end
    }
}

impl Default for DaypartingWindow {
    /// Office hours, 09:00 to 17:00.
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

fn parse_time_of_day(raw: &str) -> ResultEngine<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| EngineError::InvalidWindow(format!("invalid time of day: {raw}")))
}

/// Budget check: deactivate once a cap is reached, never reactivate.
pub fn budget_check(spend: &SpendTotals, budget: &Budget, is_active: bool) -> bool {
    is_active && !spend.exhausts(budget)
}

/// Dayparting + budget check: the state the campaign should be in at `now`.
pub fn dayparting_check(
    spend: &SpendTotals,
    budget: &Budget,
    window: &DaypartingWindow,
    now: NaiveTime,
) -> bool {
    window.contains(now) && spend.has_headroom(budget)
}
