//! Entity factories.
//!
//! # Responsibility
//! - Validate property shape before an `Entity` is constructed.
//! - Own the sentinel empty entity for one entity kind.
//! - Project entities into flat dictionaries for presentation.
//!
//! # Invariants
//! - `create` never substitutes the sentinel on failure; it returns the
//!   validation error.
//! - The sentinel is built once per factory and handed out by reference.

use crate::model::entity::{
    Entity, EntityId, EntityValidationError, Properties, EMPTY_ENTITY_ID,
};
use serde_json::{Map, Value};

/// Property holding a user's display name.
pub const TITLE_PROPERTY: &str = "title";

/// Builds and validates entities of one kind.
pub trait EntityFactory: Send + Sync {
    /// Stable tag for the entity kind. Used to name tables.
    fn factory_name(&self) -> &'static str;

    /// Keys every entity of this kind must carry. No other keys are allowed.
    fn required_properties(&self) -> &'static [&'static str];

    /// Returns the cached sentinel (`id = -1`, empty required fields).
    fn create_empty(&self) -> &Entity;

    /// Builds a validated entity.
    ///
    /// # Errors
    /// - `ReservedId` for `id = -1`.
    /// - `MissingProperty` / `UnexpectedProperty` when the shape is wrong.
    fn create(
        &self,
        id: EntityId,
        properties: Properties,
    ) -> Result<Entity, EntityValidationError> {
        if id == EMPTY_ENTITY_ID {
            return Err(EntityValidationError::ReservedId);
        }
        validate_shape(self.required_properties(), &properties)?;
        Ok(Entity::new_unchecked(id, properties))
    }

    /// Flat mapping with `id` first followed by properties.
    fn to_dict(&self, entity: &Entity) -> Map<String, Value> {
        let mut dict = Map::new();
        dict.insert("id".to_string(), Value::from(entity.id()));
        for (name, value) in entity.properties() {
            dict.insert(name.clone(), Value::String(value.clone()));
        }
        dict
    }
}

fn validate_shape(
    required: &'static [&'static str],
    properties: &Properties,
) -> Result<(), EntityValidationError> {
    if let Some(missing) = required.iter().find(|key| !properties.contains_key(**key)) {
        return Err(EntityValidationError::MissingProperty(*missing));
    }
    if let Some(extra) = properties
        .keys()
        .find(|key| !required.iter().any(|name| *name == key.as_str()))
    {
        return Err(EntityValidationError::UnexpectedProperty(extra.clone()));
    }
    Ok(())
}

/// Factory for `user` entities (`title` only).
#[derive(Debug, Clone)]
pub struct UserFactory {
    empty: Entity,
}

impl UserFactory {
    const REQUIRED: &'static [&'static str] = &[TITLE_PROPERTY];

    pub fn new() -> Self {
        let mut properties = Properties::new();
        properties.insert(TITLE_PROPERTY.to_string(), String::new());
        Self {
            empty: Entity::new_unchecked(EMPTY_ENTITY_ID, properties),
        }
    }

    /// Shorthand for `create(id, {"title": title})`.
    pub fn create_user(
        &self,
        id: EntityId,
        title: impl Into<String>,
    ) -> Result<Entity, EntityValidationError> {
        let mut properties = Properties::new();
        properties.insert(TITLE_PROPERTY.to_string(), title.into());
        self.create(id, properties)
    }
}

impl Default for UserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityFactory for UserFactory {
    fn factory_name(&self) -> &'static str {
        "user"
    }

    fn required_properties(&self) -> &'static [&'static str] {
        Self::REQUIRED
    }

    fn create_empty(&self) -> &Entity {
        &self.empty
    }
}
