//! Domain model for stored records.
//!
//! # Responsibility
//! - Define the canonical `Entity` shape shared by every repository backend.
//! - Provide factories that validate shape before an entity exists.
//!
//! # Invariants
//! - Every stored entity has an id different from `EMPTY_ENTITY_ID`.
//! - Entities are immutable after construction.

pub mod entity;
pub mod factory;
