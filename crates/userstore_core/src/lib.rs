//! Storage core for the user resource.
//! One repository contract, three interchangeable backends, picked at startup.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{load_config, ConfigError, RepositoryConfig};
pub use logging::{init_logging, logging_status, LogLevel};
pub use model::entity::{
    parse_entity_id, Entity, EntityId, EntityValidationError, Properties, EMPTY_ENTITY_ID,
};
pub use model::factory::{EntityFactory, UserFactory, TITLE_PROPERTY};
pub use repo::factory::{create_repository, BackendKind, UnknownBackendError};
pub use repo::ram_repo::RamRepository;
pub use repo::repository::{RepoError, RepoResult, Repository};
pub use repo::slot_repo::{SlotLayout, SlotRepository, DEFAULT_MAX_RECORDS, DEFAULT_RECORD_WIDTH};
pub use repo::sqlite_repo::{CacheStats, SqliteRepository};
pub use service::user_service::UserService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
