//! Entity domain model.
//!
//! # Responsibility
//! - Define the record shape (`id` + named string properties).
//! - Define validation errors raised while building records.
//!
//! # Invariants
//! - `EMPTY_ENTITY_ID` is reserved for the "no such entity" sentinel.
//! - Fields are private; only factories construct entities.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Integer identifier, unique within one repository instance.
pub type EntityId = i64;

/// Ordered mapping of named string fields.
pub type Properties = BTreeMap<String, String>;

/// Id carried by the sentinel "empty" entity. Never assigned to stored data.
pub const EMPTY_ENTITY_ID: EntityId = -1;

/// Validation error for entity construction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValidationError {
    /// Caller tried to build a real entity with the reserved sentinel id.
    ReservedId,
    /// Untyped id input could not be parsed as an integer.
    InvalidId(String),
    MissingProperty(&'static str),
    UnexpectedProperty(String),
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReservedId => write!(f, "id {EMPTY_ENTITY_ID} is reserved for the empty entity"),
            Self::InvalidId(value) => write!(f, "id must be an integer, got `{value}`"),
            Self::MissingProperty(name) => write!(f, "missing required property `{name}`"),
            Self::UnexpectedProperty(name) => write!(f, "unexpected property `{name}`"),
        }
    }
}

impl Error for EntityValidationError {}

/// Domain record with an id and named properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    id: EntityId,
    properties: Properties,
}

impl Entity {
    /// Builds an entity without shape checks.
    ///
    /// Factories call this after validating; keep it crate-private so no
    /// caller can bypass them.
    pub(crate) fn new_unchecked(id: EntityId, properties: Properties) -> Self {
        Self { id, properties }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Returns one property value by name.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Returns whether this is the sentinel "not found" value.
    pub fn is_empty(&self) -> bool {
        self.id == EMPTY_ENTITY_ID
    }
}

/// Flat wire shape: `id` first, then every property as a sibling key.
impl Serialize for Entity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.properties.len() + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (name, value) in &self.properties {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Parses untyped id input (for example a request parameter).
///
/// # Errors
/// - `InvalidId` when the trimmed text is not an `i64`.
/// - `ReservedId` when the text names the sentinel id.
pub fn parse_entity_id(value: &str) -> Result<EntityId, EntityValidationError> {
    let id = value
        .trim()
        .parse::<EntityId>()
        .map_err(|_| EntityValidationError::InvalidId(value.to_string()))?;
    if id == EMPTY_ENTITY_ID {
        return Err(EntityValidationError::ReservedId);
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::{parse_entity_id, EntityValidationError};

    #[test]
    fn parse_entity_id_accepts_padded_integers() {
        assert_eq!(parse_entity_id(" 42 ").unwrap(), 42);
    }

    #[test]
    fn parse_entity_id_rejects_non_integers_and_sentinel() {
        assert_eq!(
            parse_entity_id("4.5").unwrap_err(),
            EntityValidationError::InvalidId("4.5".to_string())
        );
        assert_eq!(
            parse_entity_id("-1").unwrap_err(),
            EntityValidationError::ReservedId
        );
    }
}
