use sea_orm_migration::prelude::*;

use crate::m20260801_000002_owners::Owners;
use crate::m20260801_000003_tags::Tags;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub(crate) enum LpgRefills {
    Table,
    Id,
    BillAmountMinor,
    Gallons,
    RefillDate,
    EfficiencyPercent,
    TagId,
}

#[derive(Iden)]
enum LpgRefillEntries {
    Table,
    Id,
    RefillId,
    OwnerId,
    PreviousReading,
    CurrentReading,
    Consumption,
    Percentage,
    Subtotal,
    TotalAmount,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LpgRefills::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LpgRefills::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LpgRefills::BillAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LpgRefills::Gallons).double().not_null())
                    .col(
                        ColumnDef::new(LpgRefills::RefillDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LpgRefills::EfficiencyPercent)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(LpgRefills::TagId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-lpg_refills-tag_id")
                            .from(LpgRefills::Table, LpgRefills::TagId)
                            .to(Tags::Table, Tags::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LpgRefillEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LpgRefillEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LpgRefillEntries::RefillId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LpgRefillEntries::OwnerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LpgRefillEntries::PreviousReading)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LpgRefillEntries::CurrentReading)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LpgRefillEntries::Consumption)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LpgRefillEntries::Percentage)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LpgRefillEntries::Subtotal)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LpgRefillEntries::TotalAmount)
                            .double()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-lpg_refill_entries-refill_id")
                            .from(LpgRefillEntries::Table, LpgRefillEntries::RefillId)
                            .to(LpgRefills::Table, LpgRefills::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-lpg_refill_entries-owner_id")
                            .from(LpgRefillEntries::Table, LpgRefillEntries::OwnerId)
                            .to(Owners::Table, Owners::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-lpg_refill_entries-refill_id")
                    .table(LpgRefillEntries::Table)
                    .col(LpgRefillEntries::RefillId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LpgRefillEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LpgRefills::Table).to_owned())
            .await?;
        Ok(())
    }
}
