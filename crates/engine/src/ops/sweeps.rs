use chrono::NaiveTime;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CampaignState, DaypartingWindow, ResultEngine, SweepKind, reconcile};

use super::{Engine, with_tx};

/// Tally of one sweep run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub kind: SweepKind,
    /// Campaigns visited (including the failed ones).
    pub examined: usize,
    /// Campaigns whose row was rewritten.
    pub updated: usize,
    pub failed: usize,
}

impl SweepReport {
    fn new(kind: SweepKind) -> Self {
        Self {
            kind,
            examined: 0,
            updated: 0,
            failed: 0,
        }
    }
}

impl Engine {
    /// Deactivate every campaign that reached a cap.
    pub async fn run_budget_sweep(&self) -> ResultEngine<SweepReport> {
        self.run_sweep(SweepKind::Budget).await
    }

    /// Align every campaign's active flag with its window and budget.
    pub async fn run_dayparting_sweep(&self) -> ResultEngine<SweepReport> {
        self.run_sweep(SweepKind::Dayparting).await
    }

    pub async fn run_daily_reset(&self) -> ResultEngine<SweepReport> {
        self.run_sweep(SweepKind::DailyReset).await
    }

    pub async fn run_monthly_reset(&self) -> ResultEngine<SweepReport> {
        self.run_sweep(SweepKind::MonthlyReset).await
    }

    /// Reconcile every campaign under `kind`, one campaign at a time.
    ///
    /// Each campaign is handled in its own lock + transaction. A failure on
    /// one campaign is logged and counted, and the sweep moves on. The only
    /// error returned is failing to list the campaigns in the first place.
    pub async fn run_sweep(&self, kind: SweepKind) -> ResultEngine<SweepReport> {
        let now = self.clock.time_of_day();
        let campaign_ids = self.campaign_uuids(&self.database, None).await?;

        let mut report = SweepReport::new(kind);
        for campaign_id in campaign_ids {
            report.examined += 1;
            match self.sweep_campaign(kind, campaign_id, now).await {
                Ok(true) => report.updated += 1,
                Ok(false) => {}
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(%kind, %campaign_id, "sweep skipped campaign: {err}");
                }
            }
        }

        tracing::info!(
            %kind,
            examined = report.examined,
            updated = report.updated,
            failed = report.failed,
            "sweep finished"
        );
        Ok(report)
    }

    /// Returns whether the campaign row changed.
    async fn sweep_campaign(
        &self,
        kind: SweepKind,
        campaign_id: Uuid,
        now: NaiveTime,
    ) -> ResultEngine<bool> {
        let _guard = self.locks.acquire(campaign_id, self.lock_timeout).await?;
        with_tx!(self, |db_tx| {
            self.sweep_campaign_locked(&db_tx, kind, campaign_id, now)
                .await
        })
    }

    async fn sweep_campaign_locked(
        &self,
        db_tx: &DatabaseTransaction,
        kind: SweepKind,
        campaign_id: Uuid,
        now: NaiveTime,
    ) -> ResultEngine<bool> {
        // Deleted since the id snapshot.
        let Some((campaign, brand)) = self.find_campaign_with_brand(db_tx, campaign_id).await?
        else {
            return Ok(false);
        };

        // Only the dayparting sweep reads the window, so a row with an unusable
        // window still gets its counters reset.
        let window = match kind {
            SweepKind::Dayparting => {
                DaypartingWindow::new(campaign.dayparting_start, campaign.dayparting_end)?
            }
            _ => DaypartingWindow::default(),
        };
        let current = CampaignState {
            spend: campaign.spend(),
            is_active: campaign.is_active,
        };
        let next = reconcile(kind, current, &brand.budget(), &window, now);
        if next == current {
            return Ok(false);
        }

        self.write_campaign_state(db_tx, &campaign, next).await?;
        tracing::debug!(
            %kind,
            %campaign_id,
            daily = %next.spend.daily,
            monthly = %next.spend.monthly,
            is_active = next.is_active,
            "campaign reconciled"
        );
        Ok(true)
    }
}
