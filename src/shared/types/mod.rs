pub mod errors;
pub mod pagination;

pub use errors::{AppError, DomainError, InfraError};
pub use pagination::{Page, PaginationParams};
