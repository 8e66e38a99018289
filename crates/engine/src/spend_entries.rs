//! Spend entries: the append-only record of accepted spend.

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, util::parse_uuid};

/// One accepted spend event. Never updated once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendEntry {
    pub id: Uuid,
    pub campaign_id: Uuid,
    /// Local calendar day the spend was accepted on.
    pub date: NaiveDate,
    pub amount: MoneyCents,
    pub recorded_at: NaiveDateTime,
}

impl SpendEntry {
    pub fn new(campaign_id: Uuid, amount: MoneyCents, recorded_at: NaiveDateTime) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            campaign_id,
            date: recorded_at.date(),
            amount,
            recorded_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "spend_entries")]
pub struct Model {
    /// Insertion order.
    #[sea_orm(primary_key)]
    pub seq: i64,
    #[sea_orm(unique)]
    pub id: String,
    pub campaign_id: String,
    pub date: NaiveDate,
    pub amount: i64,
    pub recorded_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::campaigns::Entity",
        from = "Column::CampaignId",
        to = "super::campaigns::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Campaigns,
}

impl Related<super::campaigns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaigns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SpendEntry> for ActiveModel {
    fn from(entry: &SpendEntry) -> Self {
        Self {
            seq: ActiveValue::NotSet,
            id: ActiveValue::Set(entry.id.to_string()),
            campaign_id: ActiveValue::Set(entry.campaign_id.to_string()),
            date: ActiveValue::Set(entry.date),
            amount: ActiveValue::Set(entry.amount.cents()),
            recorded_at: ActiveValue::Set(entry.recorded_at),
        }
    }
}

impl TryFrom<Model> for SpendEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "spend entry")?,
            campaign_id: parse_uuid(&model.campaign_id, "campaign")?,
            date: model.date,
            amount: MoneyCents::new(model.amount),
            recorded_at: model.recorded_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn entry_is_dated_by_its_local_timestamp() {
        let at = NaiveDate::from_ymd_opt(2026, 1, 31)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        let entry = SpendEntry::new(Uuid::new_v4(), MoneyCents::from_units(5), at).unwrap();
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let at = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(SpendEntry::new(Uuid::new_v4(), MoneyCents::ZERO, at).is_err());
        assert!(SpendEntry::new(Uuid::new_v4(), MoneyCents::new(-5), at).is_err());
    }
}
