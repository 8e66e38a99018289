use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Brand, Campaign, DaypartingWindow, MoneyCents, ResultEngine, SpendEntry, brands, campaigns,
    spend_entries,
};

use super::{Engine, with_tx};

/// A brand and how many campaigns it owns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandSummary {
    #[serde(flatten)]
    pub brand: Brand,
    pub campaigns_count: usize,
}

/// A campaign joined with its brand's name and ceilings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignView {
    pub id: Uuid,
    pub name: String,
    pub brand_id: Uuid,
    pub brand_name: String,
    pub daily_budget: MoneyCents,
    pub monthly_budget: MoneyCents,
    pub daily_spend: MoneyCents,
    pub monthly_spend: MoneyCents,
    pub window: DaypartingWindow,
    pub is_active: bool,
}

/// Filters for listing spend entries. Both are optional and combine with AND.
#[derive(Clone, Debug, Default)]
pub struct SpendEntryFilter {
    pub campaign_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendEntryView {
    #[serde(flatten)]
    pub entry: SpendEntry,
    pub campaign_name: String,
    pub brand_name: String,
}

/// Aggregate counters over the whole ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total_brands: u64,
    pub total_campaigns: u64,
    pub active_campaigns: u64,
    pub paused_campaigns: u64,
    /// Campaigns with `daily_spend >= daily_budget`.
    pub over_daily_budget: u64,
    /// Campaigns with `monthly_spend >= monthly_budget`.
    pub over_monthly_budget: u64,
    pub server_time: NaiveDateTime,
}

impl Engine {
    /// Return a brand snapshot from DB.
    pub async fn brand(&self, brand_id: Uuid) -> ResultEngine<Brand> {
        with_tx!(self, |db_tx| {
            let model = self.require_brand(&db_tx, brand_id).await?;
            Brand::try_from(model)
        })
    }

    /// Return a campaign snapshot from DB.
    pub async fn campaign(&self, campaign_id: Uuid) -> ResultEngine<Campaign> {
        with_tx!(self, |db_tx| {
            let model = self.require_campaign(&db_tx, campaign_id).await?;
            Campaign::try_from(model)
        })
    }

    /// Every brand, ordered by name.
    pub async fn brands(&self) -> ResultEngine<Vec<BrandSummary>> {
        with_tx!(self, |db_tx| {
            let rows = brands::Entity::find()
                .order_by_asc(brands::Column::Name)
                .order_by_asc(brands::Column::Id)
                .find_with_related(campaigns::Entity)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(rows.len());
            for (brand, campaigns) in rows {
                out.push(BrandSummary {
                    brand: Brand::try_from(brand)?,
                    campaigns_count: campaigns.len(),
                });
            }
            Ok(out)
        })
    }

    /// Every campaign with its brand, ordered by brand then campaign name.
    pub async fn campaigns(&self) -> ResultEngine<Vec<CampaignView>> {
        with_tx!(self, |db_tx| {
            let rows = campaigns::Entity::find()
                .find_also_related(brands::Entity)
                .order_by_asc(brands::Column::Name)
                .order_by_asc(campaigns::Column::Name)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(rows.len());
            for (campaign_model, brand_model) in rows {
                let Some(brand_model) = brand_model else {
                    continue;
                };
                let campaign = Campaign::try_from(campaign_model)?;
                out.push(CampaignView {
                    id: campaign.id,
                    name: campaign.name,
                    brand_id: campaign.brand_id,
                    brand_name: brand_model.name,
                    daily_budget: MoneyCents::new(brand_model.daily_budget),
                    monthly_budget: MoneyCents::new(brand_model.monthly_budget),
                    daily_spend: campaign.daily_spend,
                    monthly_spend: campaign.monthly_spend,
                    window: campaign.window,
                    is_active: campaign.is_active,
                });
            }
            Ok(out)
        })
    }

    /// Spend entries matching `filter`, oldest first.
    pub async fn spend_entries(
        &self,
        filter: &SpendEntryFilter,
    ) -> ResultEngine<Vec<SpendEntryView>> {
        with_tx!(self, |db_tx| {
            let mut query = spend_entries::Entity::find();
            if let Some(campaign_id) = filter.campaign_id {
                query = query.filter(spend_entries::Column::CampaignId.eq(campaign_id.to_string()));
            }
            if let Some(date) = filter.date {
                query = query.filter(spend_entries::Column::Date.eq(date));
            }
            let rows = query
                .find_also_related(campaigns::Entity)
                .order_by_asc(spend_entries::Column::RecordedAt)
                .order_by_asc(spend_entries::Column::Seq)
                .all(&db_tx)
                .await?;

            let brand_names: HashMap<String, String> = brands::Entity::find()
                .select_only()
                .column(brands::Column::Id)
                .column(brands::Column::Name)
                .into_tuple::<(String, String)>()
                .all(&db_tx)
                .await?
                .into_iter()
                .collect();

            let mut out = Vec::with_capacity(rows.len());
            for (entry_model, campaign_model) in rows {
                let Some(campaign_model) = campaign_model else {
                    continue;
                };
                let brand_name = brand_names
                    .get(&campaign_model.brand_id)
                    .cloned()
                    .unwrap_or_default();
                out.push(SpendEntryView {
                    entry: SpendEntry::try_from(entry_model)?,
                    campaign_name: campaign_model.name,
                    brand_name,
                });
            }
            Ok(out)
        })
    }

    /// Counts over brands and campaigns, stamped with the engine clock.
    pub async fn status(&self) -> ResultEngine<StatusSummary> {
        let server_time = self.clock.now();
        with_tx!(self, |db_tx| {
            let total_brands = brands::Entity::find().count(&db_tx).await?;
            let total_campaigns = campaigns::Entity::find().count(&db_tx).await?;
            let active_campaigns = campaigns::Entity::find()
                .filter(campaigns::Column::IsActive.eq(true))
                .count(&db_tx)
                .await?;
            let over_daily_budget = campaigns::Entity::find()
                .inner_join(brands::Entity)
                .filter(
                    Expr::col((campaigns::Entity, campaigns::Column::DailySpend))
                        .gte(Expr::col((brands::Entity, brands::Column::DailyBudget))),
                )
                .count(&db_tx)
                .await?;
            let over_monthly_budget = campaigns::Entity::find()
                .inner_join(brands::Entity)
                .filter(
                    Expr::col((campaigns::Entity, campaigns::Column::MonthlySpend))
                        .gte(Expr::col((brands::Entity, brands::Column::MonthlyBudget))),
                )
                .count(&db_tx)
                .await?;

            Ok(StatusSummary {
                total_brands,
                total_campaigns,
                active_campaigns,
                paused_campaigns: total_campaigns.saturating_sub(active_campaigns),
                over_daily_budget,
                over_monthly_budget,
                server_time,
            })
        })
    }
}
