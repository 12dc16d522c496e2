//! Repository traits for the domain layer

use super::booking::BookingRepository;
use super::lot::LotRepository;
use super::notification::NotificationRepository;
use crate::shared::types::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let lot = repos.lots().find_by_id(1).await?;
///     let booking = repos.bookings().find_by_id(42).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn lots(&self) -> &dyn LotRepository;
    fn bookings(&self) -> &dyn BookingRepository;
    fn notifications(&self) -> &dyn NotificationRepository;
}
