//! SQLite-backed repository with a process-local read cache.
//!
//! # Responsibility
//! - Persist entities in one table named after the entity factory.
//! - Serve repeated `get` calls from a cache that every write clears.
//!
//! # Invariants
//! - Construction drops and recreates the table; prior rows are discarded.
//! - Each operation opens its own connection and drops it afterwards.
//! - `add`/`update`/`delete` are single statements decided by the changed
//!   row count, so no check-then-act window exists in SQL.
//! - Every `add`/`update`/`delete` clears the whole cache under the same lock
//!   as the write, whatever the outcome. `list` is never cached.
//! - Query failures surface as `RepoError::Db`; they are never cached and
//!   never reported as empty results.

use crate::db::{open_connection, reset_table, TITLE_MAX_CHARS};
use crate::model::entity::{Entity, EntityId, EntityValidationError, Properties};
use crate::model::factory::{EntityFactory, TITLE_PROPERTY};
use crate::repo::factory::BackendKind;
use crate::repo::repository::{
    ensure_storable, lock_state, log_mutation, RepoError, RepoResult, Repository,
};
use log::debug;
use rusqlite::{params, Row};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const BACKEND: &str = "sqlite";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CacheKey {
    Get(EntityId),
}

/// Cache hit/miss counters since construction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, Option<Entity>>,
    stats: CacheStats,
}

/// Relational backend over one SQLite database file.
pub struct SqliteRepository {
    factory: Arc<dyn EntityFactory>,
    path: PathBuf,
    table: String,
    cache: Mutex<CacheState>,
}

impl SqliteRepository {
    /// Creates the database file if needed and resets the backing table.
    ///
    /// # Errors
    /// - `Db` when the file cannot be opened or the DDL fails.
    pub fn new(factory: Arc<dyn EntityFactory>, path: impl Into<PathBuf>) -> RepoResult<Self> {
        let path = path.into();
        let table = format!("{}s", factory.factory_name());
        reset_table(&path, &table)?;

        Ok(Self {
            factory,
            path,
            table,
            cache: Mutex::new(CacheState::default()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Number of cached `get` results.
    pub fn cache_len(&self) -> RepoResult<usize> {
        Ok(lock_state(&self.cache, BACKEND)?.entries.len())
    }

    pub fn cache_stats(&self) -> RepoResult<CacheStats> {
        Ok(lock_state(&self.cache, BACKEND)?.stats)
    }

    fn title<'a>(&self, entity: &'a Entity) -> RepoResult<&'a str> {
        let title = entity
            .property(TITLE_PROPERTY)
            .ok_or(EntityValidationError::MissingProperty(TITLE_PROPERTY))?;
        let len = title.chars().count();
        if len > TITLE_MAX_CHARS {
            return Err(RepoError::RecordTooLarge {
                id: entity.id(),
                len,
                max: TITLE_MAX_CHARS,
            });
        }
        Ok(title)
    }

    fn parse_row(&self, row: &Row<'_>) -> RepoResult<Entity> {
        let id: EntityId = row.get("id")?;
        let mut properties = Properties::new();
        properties.insert(TITLE_PROPERTY.to_string(), row.get("title")?);
        self.factory.create(id, properties).map_err(|err| {
            RepoError::InvalidData(format!("row {id} in {}: {err}", self.table))
        })
    }

    fn query_one(&self, id: EntityId) -> RepoResult<Option<Entity>> {
        let conn = open_connection(&self.path)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, title FROM {} WHERE id = ?1;",
            self.table
        ))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.parse_row(row)?));
        }
        Ok(None)
    }

    /// Runs one write statement and returns the changed row count.
    fn execute_write(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<usize> {
        let conn = open_connection(&self.path)?;
        Ok(conn.execute(sql, params)?)
    }

    fn add_locked(&self, entity: &Entity) -> RepoResult<()> {
        ensure_storable(entity)?;
        let title = self.title(entity)?;
        let changed = self.execute_write(
            &format!(
                "INSERT OR IGNORE INTO {} (id, title) VALUES (?1, ?2);",
                self.table
            ),
            params![entity.id(), title],
        )?;
        if changed == 0 {
            return Err(RepoError::Conflict(entity.id()));
        }
        Ok(())
    }

    fn update_locked(&self, entity: &Entity) -> RepoResult<()> {
        ensure_storable(entity)?;
        let title = self.title(entity)?;
        let changed = self.execute_write(
            &format!("UPDATE {} SET title = ?2 WHERE id = ?1;", self.table),
            params![entity.id(), title],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(entity.id()));
        }
        Ok(())
    }

    fn delete_locked(&self, id: EntityId) -> RepoResult<()> {
        let changed = self.execute_write(
            &format!("DELETE FROM {} WHERE id = ?1;", self.table),
            params![id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    /// Runs a write under the cache lock and clears the cache afterwards.
    fn write_through(
        &self,
        op: &str,
        id: EntityId,
        write: impl FnOnce() -> RepoResult<()>,
    ) -> RepoResult<()> {
        let mut cache = lock_state(&self.cache, BACKEND)?;
        let result = write();
        cache.entries.clear();
        log_mutation(BACKEND, op, id, &result);
        result
    }
}

impl Repository for SqliteRepository {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<Entity>> {
        let mut cache = lock_state(&self.cache, BACKEND)?;
        let key = CacheKey::Get(id);
        if let Some(hit) = cache.entries.get(&key) {
            let hit = hit.clone();
            cache.stats.hits += 1;
            debug!("event=repo_get module=repo backend={BACKEND} cache=hit id={id}");
            return Ok(hit);
        }

        cache.stats.misses += 1;
        let loaded = self.query_one(id)?;
        cache.entries.insert(key, loaded.clone());
        debug!("event=repo_get module=repo backend={BACKEND} cache=miss id={id}");
        Ok(loaded)
    }

    fn list(&self) -> RepoResult<Vec<Entity>> {
        let _cache = lock_state(&self.cache, BACKEND)?;
        let conn = open_connection(&self.path)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, title FROM {} ORDER BY id ASC;",
            self.table
        ))?;
        let mut rows = stmt.query([])?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(self.parse_row(row)?);
        }
        Ok(entities)
    }

    fn add(&self, entity: &Entity) -> RepoResult<()> {
        self.write_through("add", entity.id(), || self.add_locked(entity))
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        self.write_through("delete", id, || self.delete_locked(id))
    }

    fn update(&self, entity: &Entity) -> RepoResult<()> {
        self.write_through("update", entity.id(), || self.update_locked(entity))
    }
}
