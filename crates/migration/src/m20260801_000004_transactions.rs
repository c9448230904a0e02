use sea_orm_migration::prelude::*;

use crate::m20260801_000002_owners::Owners;
use crate::m20260801_000003_tags::Tags;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Batches {
    Table,
    Id,
    StoredFilename,
    OriginalFilename,
    ProcessedAt,
    TotalCount,
    NewCount,
    DuplicateCount,
}

#[derive(Iden)]
pub(crate) enum Transactions {
    Table,
    Id,
    Kind,
    AmountMinor,
    OccurredAt,
    Description,
    BankDescription,
    OwnerId,
    Category,
    Reference,
    Serial,
    BatchId,
    IsDuplicate,
    CreatedBy,
}

#[derive(Iden)]
enum TransactionTags {
    Table,
    TransactionId,
    TagId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Batches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Batches::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Batches::StoredFilename).string().not_null())
                    .col(
                        ColumnDef::new(Batches::OriginalFilename)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Batches::ProcessedAt).timestamp().not_null())
                    .col(ColumnDef::new(Batches::TotalCount).integer().not_null())
                    .col(ColumnDef::new(Batches::NewCount).integer().not_null())
                    .col(ColumnDef::new(Batches::DuplicateCount).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Description).string().not_null())
                    .col(ColumnDef::new(Transactions::BankDescription).string())
                    .col(ColumnDef::new(Transactions::OwnerId).string())
                    .col(ColumnDef::new(Transactions::Category).string())
                    .col(ColumnDef::new(Transactions::Reference).string())
                    .col(ColumnDef::new(Transactions::Serial).string())
                    .col(ColumnDef::new(Transactions::BatchId).string())
                    .col(
                        ColumnDef::new(Transactions::IsDuplicate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-owner_id")
                            .from(Transactions::Table, Transactions::OwnerId)
                            .to(Owners::Table, Owners::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-batch_id")
                            .from(Transactions::Table, Transactions::BatchId)
                            .to(Batches::Table, Batches::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // The duplicate natural key: (occurred_at, amount, kind, serial).
        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-dup-key")
                    .table(Transactions::Table)
                    .col(Transactions::OccurredAt)
                    .col(Transactions::AmountMinor)
                    .col(Transactions::Kind)
                    .col(Transactions::Serial)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-batch_id")
                    .table(Transactions::Table)
                    .col(Transactions::BatchId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-owner_id")
                    .table(Transactions::Table)
                    .col(Transactions::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TransactionTags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionTags::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionTags::TagId).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(TransactionTags::TransactionId)
                            .col(TransactionTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_tags-transaction_id")
                            .from(TransactionTags::Table, TransactionTags::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_tags-tag_id")
                            .from(TransactionTags::Table, TransactionTags::TagId)
                            .to(Tags::Table, Tags::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_tags-tag_id")
                    .table(TransactionTags::Table)
                    .col(TransactionTags::TagId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TransactionTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Batches::Table).to_owned())
            .await?;
        Ok(())
    }
}
