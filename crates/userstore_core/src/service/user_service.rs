//! User use-case service.
//!
//! # Responsibility
//! - Build validated user entities from caller input and hand them to the
//!   configured repository.
//! - Translate absence into the factory's sentinel for presentation layers
//!   that expect an entity value.
//!
//! # Invariants
//! - The repository and factory are injected once; no process-wide state.
//! - Validation runs before any repository call.

use crate::config::RepositoryConfig;
use crate::model::entity::{parse_entity_id, Entity, EntityId};
use crate::model::factory::{EntityFactory, UserFactory};
use crate::repo::factory::create_repository;
use crate::repo::repository::{RepoResult, Repository};
use serde_json::{Map, Value};
use std::sync::Arc;

/// CRUD entry points for `user` entities.
pub struct UserService {
    repo: Box<dyn Repository>,
    factory: Arc<UserFactory>,
}

impl UserService {
    pub fn new(repo: Box<dyn Repository>, factory: Arc<UserFactory>) -> Self {
        Self { repo, factory }
    }

    /// Wires a fresh `UserFactory` to the backend named by `config`.
    pub fn from_config(config: &RepositoryConfig) -> RepoResult<Self> {
        let factory = Arc::new(UserFactory::new());
        let repo = create_repository(config, factory.clone())?;
        Ok(Self::new(repo, factory))
    }

    pub fn factory(&self) -> &UserFactory {
        &self.factory
    }

    pub fn repository(&self) -> &dyn Repository {
        self.repo.as_ref()
    }

    /// Returns the stored user, or a copy of the sentinel when absent.
    pub fn get_user(&self, id: EntityId) -> RepoResult<Entity> {
        Ok(self
            .repo
            .get(id)?
            .unwrap_or_else(|| self.factory.create_empty().clone()))
    }

    pub fn list_users(&self) -> RepoResult<Vec<Entity>> {
        self.repo.list()
    }

    /// Creates and stores a user, returning the stored value.
    pub fn add_user(&self, id: EntityId, title: impl Into<String>) -> RepoResult<Entity> {
        let user = self.factory.create_user(id, title)?;
        self.repo.add(&user)?;
        Ok(user)
    }

    /// Like `add_user`, for callers holding the id as text.
    pub fn add_user_raw(&self, id: &str, title: impl Into<String>) -> RepoResult<Entity> {
        let id = parse_entity_id(id)?;
        self.add_user(id, title)
    }

    /// Replaces the title of an existing user.
    pub fn update_user(&self, id: EntityId, title: impl Into<String>) -> RepoResult<Entity> {
        let user = self.factory.create_user(id, title)?;
        self.repo.update(&user)?;
        Ok(user)
    }

    pub fn delete_user(&self, id: EntityId) -> RepoResult<()> {
        self.repo.delete(id)
    }

    pub fn user_dict(&self, user: &Entity) -> Map<String, Value> {
        self.factory.to_dict(user)
    }

    /// Every stored user as a flat dictionary, in backend order.
    pub fn list_user_dicts(&self) -> RepoResult<Vec<Map<String, Value>>> {
        Ok(self
            .list_users()?
            .iter()
            .map(|user| self.factory.to_dict(user))
            .collect())
    }
}
