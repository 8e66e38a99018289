//! The module contains `Brand`, the budget owner.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Budget, EngineError, MoneyCents, ResultEngine, util::parse_uuid};

/// A brand owns the daily and monthly ceilings shared by all its campaigns.
///
/// No relation between the two ceilings is enforced: a daily budget larger
/// than the monthly one is accepted as is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub daily_budget: MoneyCents,
    pub monthly_budget: MoneyCents,
}

impl Brand {
    pub fn new(
        name: String,
        daily_budget: MoneyCents,
        monthly_budget: MoneyCents,
    ) -> ResultEngine<Self> {
        if daily_budget.is_negative() || monthly_budget.is_negative() {
            return Err(EngineError::InvalidAmount(
                "budgets must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            daily_budget,
            monthly_budget,
        })
    }

    pub fn budget(&self) -> Budget {
        Budget {
            daily: self.daily_budget,
            monthly: self.monthly_budget,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "brands")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub daily_budget: i64,
    pub monthly_budget: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::campaigns::Entity")]
    Campaigns,
}

impl Related<super::campaigns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaigns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn budget(&self) -> Budget {
        Budget {
            daily: MoneyCents::new(self.daily_budget),
            monthly: MoneyCents::new(self.monthly_budget),
        }
    }
}

impl From<&Brand> for ActiveModel {
    fn from(brand: &Brand) -> Self {
        Self {
            id: ActiveValue::Set(brand.id.to_string()),
            name: ActiveValue::Set(brand.name.clone()),
            daily_budget: ActiveValue::Set(brand.daily_budget.cents()),
            monthly_budget: ActiveValue::Set(brand.monthly_budget.cents()),
        }
    }
}

impl TryFrom<Model> for Brand {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "brand")?,
            name: model.name,
            daily_budget: MoneyCents::new(model.daily_budget),
            monthly_budget: MoneyCents::new(model.monthly_budget),
        })
    }
}
