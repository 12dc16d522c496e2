//! Infrastructure layer: persistence and external integrations

pub mod database;
pub mod gateway;
pub mod storage;

pub use database::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};
pub use gateway::SandboxPaymentGateway;
pub use storage::MemoryRepositoryProvider;
