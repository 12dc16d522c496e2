//! Parking lot domain entity

use chrono::{DateTime, Utc};

use crate::domain::DomainResult;
use crate::shared::types::errors::DomainError;

/// A parking lot owned by a third party.
///
/// `available_spaces` is the owner-declared walk-up capacity and the
/// single shared mutable resource in the system; every mutation goes
/// through one atomic unit together with its audit entry.
#[derive(Debug, Clone)]
pub struct Lot {
    pub id: i32,
    pub owner_id: i32,
    pub name: String,
    pub address: String,
    /// Immutable after creation.
    pub total_spaces: i32,
    /// Invariant: `0 <= available_spaces <= total_spaces`.
    pub available_spaces: i32,
    pub price_per_hour_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lot {
    /// Validate a proposed available-space count against the capacity
    /// invariant.
    pub fn check_available(&self, new_available: i32) -> DomainResult<()> {
        if new_available < 0 {
            return Err(DomainError::Validation(
                "Available spaces cannot be negative".to_string(),
            ));
        }
        if new_available > self.total_spaces {
            return Err(DomainError::Validation(
                "Available spaces cannot exceed total spaces".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.owner_id == user_id
    }
}

/// Append-only record of one `available_spaces` mutation.
/// Created atomically with the mutation, never updated or deleted.
#[derive(Debug, Clone)]
pub struct CapacityAuditEntry {
    pub id: i32,
    pub lot_id: i32,
    pub previous_spaces: i32,
    pub new_spaces: i32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lot() -> Lot {
        let now = Utc::now();
        Lot {
            id: 1,
            owner_id: 77,
            name: "Central Garage".to_string(),
            address: "1 Main St".to_string(),
            total_spaces: 50,
            available_spaces: 50,
            price_per_hour_cents: 300,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn available_bounded_by_total() {
        let lot = sample_lot();
        assert!(lot.check_available(0).is_ok());
        assert!(lot.check_available(50).is_ok());
        assert!(lot.check_available(51).is_err());
        assert!(lot.check_available(-1).is_err());
    }

    #[test]
    fn ownership_check() {
        let lot = sample_lot();
        assert!(lot.is_owned_by(77));
        assert!(!lot.is_owned_by(78));
    }
}
