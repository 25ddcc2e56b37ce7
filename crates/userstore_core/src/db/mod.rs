//! SQLite connection bootstrap and table (re)initialization.
//!
//! # Responsibility
//! - Open short-lived SQLite connections for the relational backend.
//! - Reset the backing table when a relational repository is constructed.
//!
//! # Invariants
//! - Table names are never bound parameters, so they are validated as plain
//!   identifiers before they reach SQL text.
//! - Values (`id`, `title`) are always bound, never interpolated.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
mod schema;

pub use open::open_connection;
pub use schema::{reset_table, TITLE_MAX_CHARS};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidTableName(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidTableName(name) => write!(f, "invalid table name `{name}`"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidTableName(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
