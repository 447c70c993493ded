pub mod app_config;
pub mod database;
pub mod memory;
pub mod token_repo;
pub mod trip_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use memory::{MemoryTripRepository, MemoryUserTokenRepository};
pub use token_repo::PgUserTokenRepository;
pub use trip_repo::PgTripRepository;
