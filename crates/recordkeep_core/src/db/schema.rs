//! `kv_entries` schema setup.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

const KV_ENTRIES_SQL: &str = include_str!("kv_entries.sql");

/// Creates `kv_entries` on a fresh database and stamps the version.
///
/// # Errors
/// - `DbError::SchemaTooNew` when the file carries a later version.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(DbError::SchemaTooNew {
            found,
            supported: SCHEMA_VERSION,
        });
    }
    if found == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(KV_ENTRIES_SQL)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}
