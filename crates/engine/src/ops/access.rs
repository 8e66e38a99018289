use sea_orm::{ConnectionTrait, QueryFilter, QuerySelect, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{CampaignState, EngineError, ResultEngine, brands, campaigns, util::parse_uuid};

use super::Engine;

impl Engine {
    pub(super) async fn require_brand<C: ConnectionTrait>(
        &self,
        db: &C,
        brand_id: Uuid,
    ) -> ResultEngine<brands::Model> {
        brands::Entity::find_by_id(brand_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("brand not exists".to_string()))
    }

    pub(super) async fn require_campaign<C: ConnectionTrait>(
        &self,
        db: &C,
        campaign_id: Uuid,
    ) -> ResultEngine<campaigns::Model> {
        campaigns::Entity::find_by_id(campaign_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("campaign not exists".to_string()))
    }

    /// Load a campaign together with its owning brand, `None` if the campaign
    /// is gone.
    pub(super) async fn find_campaign_with_brand<C: ConnectionTrait>(
        &self,
        db: &C,
        campaign_id: Uuid,
    ) -> ResultEngine<Option<(campaigns::Model, brands::Model)>> {
        let Some((campaign, brand)) = campaigns::Entity::find_by_id(campaign_id.to_string())
            .find_also_related(brands::Entity)
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let brand =
            brand.ok_or_else(|| EngineError::KeyNotFound("brand not exists".to_string()))?;
        Ok(Some((campaign, brand)))
    }

    pub(super) async fn require_campaign_with_brand<C: ConnectionTrait>(
        &self,
        db: &C,
        campaign_id: Uuid,
    ) -> ResultEngine<(campaigns::Model, brands::Model)> {
        self.find_campaign_with_brand(db, campaign_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("campaign not exists".to_string()))
    }

    /// Ids of the campaigns owned by `brand_id`, or of every campaign.
    pub(super) async fn campaign_ids<C: ConnectionTrait>(
        &self,
        db: &C,
        brand_id: Option<Uuid>,
    ) -> ResultEngine<Vec<String>> {
        let mut query = campaigns::Entity::find()
            .select_only()
            .column(campaigns::Column::Id);
        if let Some(brand_id) = brand_id {
            query = query.filter(campaigns::Column::BrandId.eq(brand_id.to_string()));
        }
        query
            .into_tuple::<String>()
            .all(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn campaign_uuids<C: ConnectionTrait>(
        &self,
        db: &C,
        brand_id: Option<Uuid>,
    ) -> ResultEngine<Vec<Uuid>> {
        self.campaign_ids(db, brand_id)
            .await?
            .iter()
            .map(|id| parse_uuid(id, "campaign"))
            .collect()
    }

    /// Compare-and-swap the mutable part of a campaign row.
    ///
    /// The update only lands if the row still holds the values in `current`;
    /// otherwise another writer got there first and the caller sees
    /// [`EngineError::ConcurrencyConflict`].
    pub(super) async fn write_campaign_state<C: ConnectionTrait>(
        &self,
        db: &C,
        current: &campaigns::Model,
        next: CampaignState,
    ) -> ResultEngine<()> {
        let result = campaigns::Entity::update_many()
            .col_expr(
                campaigns::Column::DailySpend,
                Expr::value(next.spend.daily.cents()),
            )
            .col_expr(
                campaigns::Column::MonthlySpend,
                Expr::value(next.spend.monthly.cents()),
            )
            .col_expr(campaigns::Column::IsActive, Expr::value(next.is_active))
            .filter(campaigns::Column::Id.eq(current.id.as_str()))
            .filter(campaigns::Column::DailySpend.eq(current.daily_spend))
            .filter(campaigns::Column::MonthlySpend.eq(current.monthly_spend))
            .filter(campaigns::Column::IsActive.eq(current.is_active))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(EngineError::ConcurrencyConflict(current.id.clone()));
        }
        Ok(())
    }
}
