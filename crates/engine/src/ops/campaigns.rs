use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Campaign, DaypartingWindow, ResultEngine, campaigns, spend_entries,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Add a new campaign under `brand_id`.
    ///
    /// The campaign starts active with zero counters. Without a `window` it
    /// serves 09:00 to 17:00.
    pub async fn new_campaign(
        &self,
        brand_id: Uuid,
        name: &str,
        window: Option<DaypartingWindow>,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "campaign")?;
        let campaign = Campaign::new(brand_id, name, window.unwrap_or_default());
        let campaign_id = campaign.id;
        with_tx!(self, |db_tx| {
            self.require_brand(&db_tx, brand_id).await?;
            let model: campaigns::ActiveModel = (&campaign).into();
            model.insert(&db_tx).await?;
            tracing::info!(%campaign_id, %brand_id, name = %campaign.name, "campaign created");
            Ok(campaign_id)
        })
    }

    /// Delete a campaign and its spend entries.
    pub async fn delete_campaign(&self, campaign_id: Uuid) -> ResultEngine<()> {
        let guard = self.locks.acquire(campaign_id, self.lock_timeout).await?;
        self.delete_campaign_rows(campaign_id).await?;
        drop(guard);
        self.locks.forget(campaign_id);
        Ok(())
    }

    async fn delete_campaign_rows(&self, campaign_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_campaign(&db_tx, campaign_id).await?;
            spend_entries::Entity::delete_many()
                .filter(spend_entries::Column::CampaignId.eq(campaign_id.to_string()))
                .exec(&db_tx)
                .await?;
            campaigns::Entity::delete_by_id(campaign_id.to_string())
                .exec(&db_tx)
                .await?;
            tracing::info!(%campaign_id, "campaign deleted");
            Ok(())
        })
    }
}
