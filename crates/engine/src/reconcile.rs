//! State transitions applied by the reconciliation sweeps.
//!
//! [`reconcile`] is pure: given a campaign's counters, flag, budget, window and
//! the time of day, it returns the state the sweep should leave behind.

use std::{fmt, str::FromStr};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::{
    Budget, DaypartingWindow, EngineError, MoneyCents, SpendTotals,
    policy::{budget_check, dayparting_check},
};

/// The four periodic sweeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    /// Deactivate campaigns that reached a cap. Never reactivates.
    Budget,
    /// Active iff inside the window and under both caps.
    Dayparting,
    /// Zero the daily counter; reactivate if the monthly cap has headroom.
    DailyReset,
    /// Zero the monthly counter and reactivate unconditionally.
    MonthlyReset,
}

impl SweepKind {
    pub const ALL: [SweepKind; 4] = [
        SweepKind::Budget,
        SweepKind::Dayparting,
        SweepKind::DailyReset,
        SweepKind::MonthlyReset,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Dayparting => "dayparting",
            Self::DailyReset => "daily_reset",
            Self::MonthlyReset => "monthly_reset",
        }
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "budget" => Ok(Self::Budget),
            "dayparting" => Ok(Self::Dayparting),
            "daily_reset" | "daily" => Ok(Self::DailyReset),
            "monthly_reset" | "monthly" => Ok(Self::MonthlyReset),
            other => Err(EngineError::InvalidName(format!("unknown sweep: {other}"))),
        }
    }
}

/// The mutable part of a campaign row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignState {
    pub spend: SpendTotals,
    pub is_active: bool,
}

/// Next state of one campaign under `kind`.
///
/// The resets reactivate regardless of the dayparting window; the next
/// dayparting sweep brings such campaigns back in line.
pub fn reconcile(
    kind: SweepKind,
    state: CampaignState,
    budget: &Budget,
    window: &DaypartingWindow,
    now: NaiveTime,
) -> CampaignState {
    match kind {
        SweepKind::Budget => CampaignState {
            is_active: budget_check(&state.spend, budget, state.is_active),
            ..state
        },
        SweepKind::Dayparting => CampaignState {
            is_active: dayparting_check(&state.spend, budget, window, now),
            ..state
        },
        SweepKind::DailyReset => {
            let spend = SpendTotals {
                daily: MoneyCents::ZERO,
                ..state.spend
            };
            CampaignState {
                spend,
                is_active: state.is_active || spend.monthly < budget.monthly,
            }
        }
        SweepKind::MonthlyReset => CampaignState {
            spend: SpendTotals {
                monthly: MoneyCents::ZERO,
                ..state.spend
            },
            is_active: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> Budget {
        Budget {
            daily: MoneyCents::from_units(1000),
            monthly: MoneyCents::from_units(30_000),
        }
    }

    fn window() -> DaypartingWindow {
        DaypartingWindow::new(time(10, 0), time(16, 0)).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn state(daily: i64, monthly: i64, is_active: bool) -> CampaignState {
        CampaignState {
            spend: SpendTotals {
                daily: MoneyCents::from_units(daily),
                monthly: MoneyCents::from_units(monthly),
            },
            is_active,
        }
    }

    #[test]
    fn budget_sweep_only_deactivates() {
        let next = reconcile(SweepKind::Budget, state(1100, 1100, true), &budget(), &window(), time(12, 0));
        assert!(!next.is_active);

        let next = reconcile(SweepKind::Budget, state(0, 0, false), &budget(), &window(), time(12, 0));
        assert!(!next.is_active);
    }

    #[test]
    fn dayparting_follows_the_clock() {
        let early = reconcile(SweepKind::Dayparting, state(0, 0, true), &budget(), &window(), time(9, 0));
        assert!(!early.is_active);

        let noon = reconcile(SweepKind::Dayparting, early, &budget(), &window(), time(12, 0));
        assert!(noon.is_active);
    }

    #[test]
    fn dayparting_keeps_exhausted_campaigns_off() {
        let next = reconcile(SweepKind::Dayparting, state(1000, 1000, false), &budget(), &window(), time(12, 0));
        assert!(!next.is_active);
    }

    #[test]
    fn sweeps_are_idempotent() {
        for kind in [SweepKind::Budget, SweepKind::Dayparting] {
            for start in [state(0, 0, true), state(1000, 5000, true), state(10, 30_000, false)] {
                let once = reconcile(kind, start, &budget(), &window(), time(15, 0));
                let twice = reconcile(kind, once, &budget(), &window(), time(15, 0));
                assert_eq!(once, twice, "{kind} is not idempotent from {start:?}");
            }
        }
    }

    #[test]
    fn daily_reset_reactivates_outside_window_when_month_has_headroom() {
        let next = reconcile(SweepKind::DailyReset, state(1000, 5000, false), &budget(), &window(), time(0, 0));
        assert_eq!(next, state(0, 5000, true));
    }

    #[test]
    fn daily_reset_leaves_monthly_exhausted_campaigns_off() {
        let next = reconcile(SweepKind::DailyReset, state(500, 30_000, false), &budget(), &window(), time(0, 0));
        assert_eq!(next, state(0, 30_000, false));
    }

    #[test]
    fn monthly_reset_always_reactivates() {
        let next = reconcile(SweepKind::MonthlyReset, state(1000, 30_000, false), &budget(), &window(), time(0, 0));
        assert_eq!(next, state(1000, 0, true));
    }

    #[test]
    fn sweep_kind_round_trips_through_cli_names() {
        for kind in SweepKind::ALL {
            assert_eq!(kind.to_string().parse::<SweepKind>().unwrap(), kind);
        }
        assert_eq!("daily-reset".parse::<SweepKind>().unwrap(), SweepKind::DailyReset);
        assert!("weekly".parse::<SweepKind>().is_err());
    }
}
