//! Initial schema.
//!
//! - `brands`: budget owners with daily and monthly ceilings
//! - `campaigns`: spending units, one brand each
//! - `spend_entries`: append-only record of accepted spend
//!
//! Money columns hold integer cents. `spend_entries.seq` is the insertion
//! order and breaks ties between entries recorded at the same instant. Foreign keys do not cascade: the engine
//! deletes children before their parent.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Brands {
    Table,
    Id,
    Name,
    DailyBudget,
    MonthlyBudget,
}

#[derive(Iden)]
enum Campaigns {
    Table,
    Id,
    BrandId,
    Name,
    IsActive,
    DailySpend,
    MonthlySpend,
    DaypartingStart,
    DaypartingEnd,
}

#[derive(Iden)]
enum SpendEntries {
    Table,
    Seq,
    Id,
    CampaignId,
    Date,
    Amount,
    RecordedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Brands
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Brands::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Brands::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Brands::Name).string().not_null())
                    .col(
                        ColumnDef::new(Brands::DailyBudget)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Brands::DailyBudget).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Brands::MonthlyBudget)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Brands::MonthlyBudget).gte(0)),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Campaigns
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::BrandId).string().not_null())
                    .col(ColumnDef::new(Campaigns::Name).string().not_null())
                    .col(
                        ColumnDef::new(Campaigns::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Campaigns::DailySpend)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::MonthlySpend)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Campaigns::DaypartingStart).time().not_null())
                    .col(ColumnDef::new(Campaigns::DaypartingEnd).time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-campaigns-brand_id")
                            .from(Campaigns::Table, Campaigns::BrandId)
                            .to(Brands::Table, Brands::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-campaigns-brand_id")
                    .table(Campaigns::Table)
                    .col(Campaigns::BrandId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Spend entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SpendEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SpendEntries::Seq)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SpendEntries::Id)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(SpendEntries::CampaignId).string().not_null())
                    .col(ColumnDef::new(SpendEntries::Date).date().not_null())
                    .col(
                        ColumnDef::new(SpendEntries::Amount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(SpendEntries::Amount).gt(0)),
                    )
                    .col(
                        ColumnDef::new(SpendEntries::RecordedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-spend_entries-campaign_id")
                            .from(SpendEntries::Table, SpendEntries::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-spend_entries-campaign_id")
                    .table(SpendEntries::Table)
                    .col(SpendEntries::CampaignId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-spend_entries-date")
                    .table(SpendEntries::Table)
                    .col(SpendEntries::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children first.
        manager
            .drop_table(Table::drop().table(SpendEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Brands::Table).to_owned())
            .await?;
        Ok(())
    }
}
