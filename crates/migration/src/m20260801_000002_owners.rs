use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub(crate) enum Owners {
    Table,
    Id,
    Name,
    Apartment,
    Email,
    Phone,
    Active,
}

#[derive(Iden)]
enum OwnerPatterns {
    Table,
    Id,
    OwnerId,
    Pattern,
    IsActive,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Owners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Owners::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Owners::Name).string().not_null())
                    .col(ColumnDef::new(Owners::Apartment).string().not_null())
                    .col(ColumnDef::new(Owners::Email).string())
                    .col(ColumnDef::new(Owners::Phone).string())
                    .col(
                        ColumnDef::new(Owners::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-owners-apartment-unique")
                    .table(Owners::Table)
                    .col(Owners::Apartment)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OwnerPatterns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OwnerPatterns::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OwnerPatterns::OwnerId).string().not_null())
                    .col(ColumnDef::new(OwnerPatterns::Pattern).string().not_null())
                    .col(
                        ColumnDef::new(OwnerPatterns::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(OwnerPatterns::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-owner_patterns-owner_id")
                            .from(OwnerPatterns::Table, OwnerPatterns::OwnerId)
                            .to(Owners::Table, Owners::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-owner_patterns-owner_id")
                    .table(OwnerPatterns::Table)
                    .col(OwnerPatterns::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OwnerPatterns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Owners::Table).to_owned())
            .await?;
        Ok(())
    }
}
