use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    CampaignState, EngineError, MoneyCents, ResultEngine, SpendEntry, policy::budget_check,
    spend_entries,
};

use super::{Engine, with_tx};

/// Result of an accepted spend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendOutcome {
    pub campaign_id: Uuid,
    pub campaign_name: String,
    pub amount: MoneyCents,
    pub new_daily_spend: MoneyCents,
    pub new_monthly_spend: MoneyCents,
    /// `false` when this spend reached one of the brand's caps.
    pub is_active: bool,
}

impl Engine {
    /// Record `amount` against a campaign.
    ///
    /// The whole amount is accepted or the request fails: there is no
    /// clamping to the remaining headroom. Accepting a spend that reaches a
    /// cap deactivates the campaign in the same transaction.
    ///
    /// Contention (`LockTimeout`, `ConcurrencyConflict`) is retried according
    /// to the engine's [`RetryPolicy`](crate::RetryPolicy); business errors
    /// are returned on the first attempt.
    pub async fn apply_spend(
        &self,
        campaign_id: Uuid,
        amount: MoneyCents,
    ) -> ResultEngine<SpendOutcome> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        self.retry
            .run(|| self.try_apply_spend(campaign_id, amount))
            .await
    }

    async fn try_apply_spend(
        &self,
        campaign_id: Uuid,
        amount: MoneyCents,
    ) -> ResultEngine<SpendOutcome> {
        let _guard = self.locks.acquire(campaign_id, self.lock_timeout).await?;
        with_tx!(self, |db_tx| {
            self.apply_spend_locked(&db_tx, campaign_id, amount).await
        })
    }

    async fn apply_spend_locked(
        &self,
        db_tx: &DatabaseTransaction,
        campaign_id: Uuid,
        amount: MoneyCents,
    ) -> ResultEngine<SpendOutcome> {
        let (campaign, brand) = self.require_campaign_with_brand(db_tx, campaign_id).await?;
        if !campaign.is_active {
            return Err(EngineError::NotActive(campaign.name));
        }

        let budget = brand.budget();
        let spend = campaign
            .spend()
            .checked_add(amount)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflows spend".to_string()))?;
        if spend.exceeds(&budget) {
            return Err(EngineError::BudgetExceeded(campaign.name));
        }

        let next = CampaignState {
            spend,
            is_active: budget_check(&spend, &budget, true),
        };
        self.write_campaign_state(db_tx, &campaign, next).await?;

        let entry = SpendEntry::new(campaign_id, amount, self.clock.now())?;
        let entry_model: spend_entries::ActiveModel = (&entry).into();
        entry_model.insert(db_tx).await?;

        tracing::debug!(
            %campaign_id,
            %amount,
            daily = %spend.daily,
            monthly = %spend.monthly,
            is_active = next.is_active,
            "spend applied"
        );

        Ok(SpendOutcome {
            campaign_id,
            campaign_name: campaign.name,
            amount,
            new_daily_spend: spend.daily,
            new_monthly_spend: spend.monthly,
            is_active: next.is_active,
        })
    }
}
