//! In-memory list-backed repository.
//!
//! # Responsibility
//! - Baseline backend: the others must be indistinguishable from it.
//!
//! # Invariants
//! - `list` returns entities in insertion order.
//! - `delete` keeps the relative order of the remaining entities.
//! - Lookup is a linear scan by id.

use crate::model::entity::{Entity, EntityId};
use crate::repo::factory::BackendKind;
use crate::repo::repository::{
    ensure_storable, lock_state, log_mutation, RepoError, RepoResult, Repository,
};
use std::sync::Mutex;

const BACKEND: &str = "ram";

/// List-of-entities store guarded by one mutex.
#[derive(Debug, Default)]
pub struct RamRepository {
    entities: Mutex<Vec<Entity>>,
}

impl RamRepository {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn add_locked(&self, entity: &Entity) -> RepoResult<()> {
        ensure_storable(entity)?;
        let mut entities = lock_state(&self.entities, BACKEND)?;
        if position(&entities, entity.id()).is_some() {
            return Err(RepoError::Conflict(entity.id()));
        }
        entities.push(entity.clone());
        Ok(())
    }

    fn update_locked(&self, entity: &Entity) -> RepoResult<()> {
        ensure_storable(entity)?;
        let mut entities = lock_state(&self.entities, BACKEND)?;
        let index = position(&entities, entity.id()).ok_or(RepoError::NotFound(entity.id()))?;
        entities[index] = entity.clone();
        Ok(())
    }
}

fn position(entities: &[Entity], id: EntityId) -> Option<usize> {
    entities.iter().position(|entity| entity.id() == id)
}

impl Repository for RamRepository {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Ram
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<Entity>> {
        let entities = lock_state(&self.entities, BACKEND)?;
        Ok(entities.iter().find(|entity| entity.id() == id).cloned())
    }

    fn list(&self) -> RepoResult<Vec<Entity>> {
        let entities = lock_state(&self.entities, BACKEND)?;
        Ok(entities.clone())
    }

    fn add(&self, entity: &Entity) -> RepoResult<()> {
        let result = self.add_locked(entity);
        log_mutation(BACKEND, "add", entity.id(), &result);
        result
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        let mut entities = lock_state(&self.entities, BACKEND)?;
        let result = match position(&entities, id) {
            Some(index) => {
                entities.remove(index);
                Ok(())
            }
            None => Err(RepoError::NotFound(id)),
        };
        log_mutation(BACKEND, "delete", id, &result);
        result
    }

    fn update(&self, entity: &Entity) -> RepoResult<()> {
        let result = self.update_locked(entity);
        log_mutation(BACKEND, "update", entity.id(), &result);
        result
    }
}
