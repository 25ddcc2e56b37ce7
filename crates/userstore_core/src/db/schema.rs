//! Destructive table initialization.

use super::{open_connection, DbError, DbResult};
use log::info;
use std::path::Path;

/// Longest title the `VARCHAR(255)` column is meant to hold.
///
/// SQLite does not enforce declared lengths, so the repository checks this.
pub const TITLE_MAX_CHARS: usize = 255;

/// Drops and recreates `table`, discarding rows from previous runs.
///
/// # Errors
/// - `InvalidTableName` when `table` is not `[A-Za-z_][A-Za-z0-9_]*`.
/// - `Sqlite` when the database cannot be opened or the DDL fails.
pub fn reset_table(path: &Path, table: &str) -> DbResult<()> {
    validate_table_name(table)?;

    let conn = open_connection(path)?;
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} (
            id INTEGER PRIMARY KEY,
            title VARCHAR({TITLE_MAX_CHARS}) NOT NULL
         );"
    ))?;

    info!("event=db_reset module=db status=ok table={table}");
    Ok(())
}

fn validate_table_name(table: &str) -> DbResult<()> {
    let mut chars = table.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_');
    if starts_ok && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Ok(());
    }
    Err(DbError::InvalidTableName(table.to_string()))
}
