//! Startup selection of exactly one repository backend.
//!
//! # Responsibility
//! - Map validated configuration to one concrete `Repository`.
//!
//! # Invariants
//! - The set of backends is closed (`BackendKind`); unknown names fail when
//!   configuration is parsed, before any backend is built.
//! - Construction happens once; there is no runtime swap.

use crate::config::RepositoryConfig;
use crate::model::factory::EntityFactory;
use crate::repo::ram_repo::RamRepository;
use crate::repo::repository::{RepoResult, Repository};
use crate::repo::slot_repo::SlotRepository;
use crate::repo::sqlite_repo::SqliteRepository;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Closed set of storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// List-backed in-memory store.
    Ram,
    /// Fixed-width byte-addressed store.
    Slots,
    /// SQLite table with a read cache.
    Sqlite,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [Self::Ram, Self::Slots, Self::Sqlite];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ram => "ram",
            Self::Slots => "slots",
            Self::Sqlite => "sqlite",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBackendError(pub String);

impl Display for UnknownBackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown repository backend `{}`; expected ram|slots|sqlite",
            self.0
        )
    }
}

impl Error for UnknownBackendError {}

impl FromStr for BackendKind {
    type Err = UnknownBackendError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ram" | "memory" => Ok(Self::Ram),
            "slots" | "bytes" => Ok(Self::Slots),
            "sqlite" | "relational" | "db" => Ok(Self::Sqlite),
            other => Err(UnknownBackendError(other.to_string())),
        }
    }
}

/// Builds the backend named by `config`.
///
/// # Errors
/// - Propagates backend construction errors (invalid slot layout, database
///   that cannot be opened or reset).
pub fn create_repository(
    config: &RepositoryConfig,
    factory: Arc<dyn EntityFactory>,
) -> RepoResult<Box<dyn Repository>> {
    let kind = config.kind();
    let built: RepoResult<Box<dyn Repository>> = match config {
        RepositoryConfig::Ram => Ok(Box::new(RamRepository::new())),
        RepositoryConfig::Slots(layout) => SlotRepository::new(factory, *layout)
            .map(|repo| Box::new(repo) as Box<dyn Repository>),
        RepositoryConfig::Sqlite { path } => SqliteRepository::new(factory, path.clone())
            .map(|repo| Box::new(repo) as Box<dyn Repository>),
    };

    match &built {
        Ok(_) => info!("event=repo_create module=repo status=ok backend={kind}"),
        Err(err) => error!(
            "event=repo_create module=repo status=error backend={kind} error_code={} error={}",
            err.code(),
            err
        ),
    }
    built
}
