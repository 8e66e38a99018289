//! The module contains `Campaign`, the spending unit under a brand.

use chrono::NaiveTime;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DaypartingWindow, EngineError, MoneyCents, SpendTotals, util::parse_uuid};

/// A campaign.
///
/// `daily_spend` and `monthly_spend` are only moved by the spend applier and
/// by the reset sweeps. `is_active` is a cached verdict of the activation
/// policy: sweeps may leave it stale for a while, the spend applier never does.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub daily_spend: MoneyCents,
    pub monthly_spend: MoneyCents,
    pub window: DaypartingWindow,
}

impl Campaign {
    /// A fresh campaign: active, nothing spent yet.
    pub fn new(brand_id: Uuid, name: String, window: DaypartingWindow) -> Self {
        Self {
            id: Uuid::new_v4(),
            brand_id,
            name,
            is_active: true,
            daily_spend: MoneyCents::ZERO,
            monthly_spend: MoneyCents::ZERO,
            window,
        }
    }

    pub fn spend(&self) -> SpendTotals {
        SpendTotals {
            daily: self.daily_spend,
            monthly: self.monthly_spend,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub brand_id: String,
    pub name: String,
    pub is_active: bool,
    pub daily_spend: i64,
    pub monthly_spend: i64,
    pub dayparting_start: NaiveTime,
    pub dayparting_end: NaiveTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brands::Entity",
        from = "Column::BrandId",
        to = "super::brands::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Brands,
    #[sea_orm(has_many = "super::spend_entries::Entity")]
    SpendEntries,
}

impl Related<super::brands::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brands.def()
    }
}

impl Related<super::spend_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SpendEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn spend(&self) -> SpendTotals {
        SpendTotals {
            daily: MoneyCents::new(self.daily_spend),
            monthly: MoneyCents::new(self.monthly_spend),
        }
    }
}

impl From<&Campaign> for ActiveModel {
    fn from(campaign: &Campaign) -> Self {
        Self {
            id: ActiveValue::Set(campaign.id.to_string()),
            brand_id: ActiveValue::Set(campaign.brand_id.to_string()),
            name: ActiveValue::Set(campaign.name.clone()),
            is_active: ActiveValue::Set(campaign.is_active),
            daily_spend: ActiveValue::Set(campaign.daily_spend.cents()),
            monthly_spend: ActiveValue::Set(campaign.monthly_spend.cents()),
            dayparting_start: ActiveValue::Set(campaign.window.start()),
            dayparting_end: ActiveValue::Set(campaign.window.end()),
        }
    }
}

impl TryFrom<Model> for Campaign {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "campaign")?,
            brand_id: parse_uuid(&model.brand_id, "brand")?,
            window: DaypartingWindow::new(model.dayparting_start, model.dayparting_end)?,
            name: model.name,
            is_active: model.is_active,
            daily_spend: MoneyCents::new(model.daily_spend),
            monthly_spend: MoneyCents::new(model.monthly_spend),
        })
    }
}
