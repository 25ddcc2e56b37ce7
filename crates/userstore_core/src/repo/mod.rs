//! Repository layer abstractions and storage backends.
//!
//! # Responsibility
//! - Define the uniform `Repository` contract.
//! - Provide three interchangeable backends (RAM list, fixed-width slots,
//!   SQLite with a read cache) and the factory that picks one at startup.
//!
//! # Invariants
//! - At most one stored entity per id within one repository instance.
//! - Every backend serializes its operations behind one mutex; each call's
//!   check and mutation happen under the same lock acquisition.
//! - Not-found and conflict are typed errors, never silent no-ops.

pub mod factory;
pub mod ram_repo;
pub mod repository;
pub mod slot_repo;
pub mod sqlite_repo;
