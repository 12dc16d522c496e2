//! Parking lot DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::lot::{CapacityAuditEntry, Lot};
use crate::interfaces::http::common::cents_to_decimal;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLotRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub address: String,
    #[validate(range(min = 1, max = 10000))]
    pub total_spaces: i32,
    /// Hourly rate as a decimal money amount, e.g. `3.50`.
    #[schema(value_type = f64, example = 3.5)]
    pub price_per_hour: Decimal,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLotRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub address: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price_per_hour: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSpacesRequest {
    #[validate(range(min = 0, max = 10000))]
    pub available_spaces: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LotResponse {
    pub id: i32,
    pub owner_id: i32,
    pub name: String,
    pub address: String,
    pub total_spaces: i32,
    pub available_spaces: i32,
    #[schema(value_type = f64)]
    pub price_per_hour: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Lot> for LotResponse {
    fn from(l: Lot) -> Self {
        Self {
            id: l.id,
            owner_id: l.owner_id,
            name: l.name,
            address: l.address,
            total_spaces: l.total_spaces,
            available_spaces: l.available_spaces,
            price_per_hour: cents_to_decimal(l.price_per_hour_cents),
            is_active: l.is_active,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CapacityAuditResponse {
    pub id: i32,
    pub lot_id: i32,
    pub previous_spaces: i32,
    pub new_spaces: i32,
    pub created_at: DateTime<Utc>,
}

impl From<CapacityAuditEntry> for CapacityAuditResponse {
    fn from(e: CapacityAuditEntry) -> Self {
        Self {
            id: e.id,
            lot_id: e.lot_id,
            previous_spaces: e.previous_spaces,
            new_spaces: e.new_spaces,
            created_at: e.created_at,
        }
    }
}

/// Response of a spaces update: the lot plus the audit entry written
/// with it.
#[derive(Debug, Serialize, ToSchema)]
pub struct SpacesChangedResponse {
    pub lot: LotResponse,
    pub audit: CapacityAuditResponse,
}
