//! Parking lot entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_lots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub owner_id: i32,
    pub name: String,
    pub address: String,

    pub total_spaces: i32,
    pub available_spaces: i32,

    /// Hourly rate in cents.
    pub price_per_hour_cents: i64,

    pub is_active: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::capacity_audit::Entity")]
    CapacityAudits,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::capacity_audit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CapacityAudits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
