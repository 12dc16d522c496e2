//! HTTP interface: REST API, identity extraction and the router.

pub mod common;
pub mod identity;
pub mod modules;
pub mod router;

pub use common::{ApiResponse, ValidatedJson};
pub use router::{create_api_router, ApiDoc, AppState};
