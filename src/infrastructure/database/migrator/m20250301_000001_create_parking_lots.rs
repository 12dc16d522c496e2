//! Create parking_lots table
//!
//! Lots carry the owner-declared capacity. `available_spaces` is the
//! mutable walk-up count; `total_spaces` never changes after creation.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingLots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingLots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingLots::OwnerId).integer().not_null())
                    .col(ColumnDef::new(ParkingLots::Name).string().not_null())
                    .col(ColumnDef::new(ParkingLots::Address).string().not_null())
                    .col(
                        ColumnDef::new(ParkingLots::TotalSpaces)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::AvailableSpaces)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::PricePerHourCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_lots_owner")
                    .table(ParkingLots::Table)
                    .col(ParkingLots::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_lots_active")
                    .table(ParkingLots::Table)
                    .col(ParkingLots::IsActive)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingLots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingLots {
    Table,
    Id,
    OwnerId,
    Name,
    Address,
    TotalSpaces,
    AvailableSpaces,
    PricePerHourCents,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
