use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Brand, MoneyCents, ResultEngine, brands, campaigns, spend_entries, util::normalize_required_name};

use super::{Engine, with_tx};

impl Engine {
    /// Add a new brand with its daily and monthly ceilings.
    pub async fn new_brand(
        &self,
        name: &str,
        daily_budget: MoneyCents,
        monthly_budget: MoneyCents,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "brand")?;
        let brand = Brand::new(name, daily_budget, monthly_budget)?;
        let brand_id = brand.id;
        with_tx!(self, |db_tx| {
            let model: brands::ActiveModel = (&brand).into();
            model.insert(&db_tx).await?;
            tracing::info!(%brand_id, name = %brand.name, "brand created");
            Ok(brand_id)
        })
    }

    /// Delete a brand together with its campaigns and their spend entries.
    ///
    /// Every affected campaign is locked (in id order) before the rows go.
    pub async fn delete_brand(&self, brand_id: Uuid) -> ResultEngine<()> {
        let campaign_ids = self.campaign_uuids(&self.database, Some(brand_id)).await?;
        let guards = self
            .locks
            .acquire_many(campaign_ids.clone(), self.lock_timeout)
            .await?;

        self.delete_brand_rows(brand_id).await?;
        drop(guards);

        for id in campaign_ids {
            self.locks.forget(id);
        }
        Ok(())
    }

    async fn delete_brand_rows(&self, brand_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_brand(&db_tx, brand_id).await?;
            // Re-read under the locks: a campaign added in between is deleted too.
            let ids = self.campaign_ids(&db_tx, Some(brand_id)).await?;

            spend_entries::Entity::delete_many()
                .filter(spend_entries::Column::CampaignId.is_in(ids.clone()))
                .exec(&db_tx)
                .await?;
            campaigns::Entity::delete_many()
                .filter(campaigns::Column::BrandId.eq(brand_id.to_string()))
                .exec(&db_tx)
                .await?;
            brands::Entity::delete_by_id(brand_id.to_string())
                .exec(&db_tx)
                .await?;
            tracing::info!(%brand_id, campaigns = ids.len(), "brand deleted");
            Ok(())
        })
    }
}
