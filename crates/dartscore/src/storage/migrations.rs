//! Database migration system for dartscore.
//!
//! Each migration is a numbered list of statements. The highest applied
//! number is kept in the `metadata` table and pending migrations run inside
//! a single transaction, so a failed upgrade leaves the file untouched.

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::schema::{CREATE_METADATA_TABLE, SCHEMA_STATEMENTS};

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// A numbered schema change.
#[derive(Debug)]
struct Migration {
    version: i32,
    description: &'static str,
    statements: &'static [&'static str],
}

/// All migrations in application order.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "create darts table",
    statements: SCHEMA_STATEMENTS,
}];

/// The schema version this build writes.
pub const CURRENT_VERSION: i32 = 1;

/// Bring the database schema up to [`CURRENT_VERSION`].
///
/// Safe to call on every open; already-applied migrations are skipped.
///
/// # Errors
///
/// Returns an error if a statement fails or the database was written by a
/// newer build.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let applied = schema_version(conn)?;
    if applied > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "schema version {applied} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }
    if applied == CURRENT_VERSION {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        debug!(
            version = migration.version,
            "Applying migration: {}", migration.description
        );
        for statement in migration.statements {
            tx.execute(statement, [])?;
        }
        set_schema_version(&tx, migration.version)?;
    }
    tx.commit()?;

    info!(from = applied, to = CURRENT_VERSION, "Database schema migrated");
    Ok(())
}

/// Read the applied schema version; 0 for a fresh database.
pub(crate) fn schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}
