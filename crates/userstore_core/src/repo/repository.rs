//! Repository contract shared by every backend.
//!
//! # Responsibility
//! - Define `get/list/add/delete/update` over validated entities.
//! - Define the error taxonomy callers match on.
//!
//! # Invariants
//! - `get` reports absence as `Ok(None)`, never as an error.
//! - `list` on an empty store is `Ok(vec![])`.
//! - `add` never overwrites; `update` never inserts.
//! - Backend failures are `RepoError::Db`, distinct from empty results.

use crate::db::DbError;
use crate::model::entity::{Entity, EntityId, EntityValidationError};
use crate::repo::factory::BackendKind;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for repository operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntityValidationError),
    /// `delete`/`update` target does not exist.
    NotFound(EntityId),
    /// `add` target already exists.
    Conflict(EntityId),
    /// Relational backend unavailable or query failed.
    Db(DbError),
    /// Id outside the addressable slot range `1..=max_records`.
    OutOfRange { id: EntityId, max_records: usize },
    /// Encoded value wider than the backend can store.
    RecordTooLarge { id: EntityId, len: usize, max: usize },
    InvalidData(String),
    LockPoisoned(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::Conflict(id) => write!(f, "entity already exists: {id}"),
            Self::Db(err) => write!(f, "storage backend unavailable: {err}"),
            Self::OutOfRange { id, max_records } => {
                write!(f, "id {id} is outside the addressable range 1..={max_records}")
            }
            Self::RecordTooLarge { id, len, max } => {
                write!(f, "record {id} is {len} long, limit is {max}")
            }
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
            Self::LockPoisoned(backend) => write!(f, "{backend} repository lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::Conflict(_)
            | Self::OutOfRange { .. }
            | Self::RecordTooLarge { .. }
            | Self::InvalidData(_)
            | Self::LockPoisoned(_) => None,
        }
    }
}

impl RepoError {
    /// Machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Db(_) => "db_unavailable",
            Self::OutOfRange { .. } => "out_of_range",
            Self::RecordTooLarge { .. } => "record_too_large",
            Self::InvalidData(_) => "invalid_data",
            Self::LockPoisoned(_) => "lock_poisoned",
        }
    }
}

impl From<EntityValidationError> for RepoError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract implemented by every backend.
///
/// Implementations are `Send + Sync` so one instance can be shared by a
/// request-dispatching host.
pub trait Repository: Send + Sync {
    /// Which backend this is.
    fn backend_kind(&self) -> BackendKind;
    /// Returns the entity stored under `id`, or `None`.
    fn get(&self, id: EntityId) -> RepoResult<Option<Entity>>;
    /// Returns every stored entity in backend order.
    fn list(&self) -> RepoResult<Vec<Entity>>;
    /// Inserts `entity`; `Conflict` when the id is taken.
    fn add(&self, entity: &Entity) -> RepoResult<()>;
    /// Removes the entity under `id`; `NotFound` when absent.
    fn delete(&self, id: EntityId) -> RepoResult<()>;
    /// Replaces the entity with the same id; `NotFound` when absent.
    fn update(&self, entity: &Entity) -> RepoResult<()>;
}

/// Rejects the sentinel entity before any backend stores it.
pub(crate) fn ensure_storable(entity: &Entity) -> RepoResult<()> {
    if entity.is_empty() {
        return Err(RepoError::Validation(EntityValidationError::ReservedId));
    }
    Ok(())
}

pub(crate) fn lock_state<'a, T>(
    state: &'a Mutex<T>,
    backend: &'static str,
) -> RepoResult<MutexGuard<'a, T>> {
    state.lock().map_err(|_| RepoError::LockPoisoned(backend))
}

/// Emits one `repo_<op>` event for a finished mutation.
pub(crate) fn log_mutation(backend: &str, op: &str, id: EntityId, result: &RepoResult<()>) {
    match result {
        Ok(()) => debug!("event=repo_{op} module=repo backend={backend} status=ok id={id}"),
        Err(err) => warn!(
            "event=repo_{op} module=repo backend={backend} status=error id={id} error_code={}",
            err.code()
        ),
    }
}
