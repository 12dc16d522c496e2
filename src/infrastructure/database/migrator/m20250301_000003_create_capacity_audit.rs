//! Create capacity_audit table
//!
//! Append-only record of available-space mutations, written in the same
//! transaction as the lot update.

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_parking_lots::ParkingLots;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CapacityAudit::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CapacityAudit::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CapacityAudit::LotId).integer().not_null())
                    .col(
                        ColumnDef::new(CapacityAudit::PreviousSpaces)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CapacityAudit::NewSpaces)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CapacityAudit::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_capacity_audit_lot")
                            .from(CapacityAudit::Table, CapacityAudit::LotId)
                            .to(ParkingLots::Table, ParkingLots::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_capacity_audit_lot")
                    .table(CapacityAudit::Table)
                    .col(CapacityAudit::LotId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CapacityAudit::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum CapacityAudit {
    Table,
    Id,
    LotId,
    PreviousSpaces,
    NewSpaces,
    CreatedAt,
}
