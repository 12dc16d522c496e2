//! Notification entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// UUID assigned at creation.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: i32,

    /// Notification kind: BOOKING_CREATED, BOOKING_CONFIRMED, ...
    pub kind: String,

    pub title: String,
    pub message: String,

    /// JSON payload, serialized.
    #[sea_orm(nullable)]
    pub payload: Option<String>,

    pub read: bool,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
