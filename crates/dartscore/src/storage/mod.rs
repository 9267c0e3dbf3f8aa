//! Storage layer for dartscore.
//!
//! This module provides `SQLite`-based persistent storage for darts records:
//! create, read, paginated listing, full and partial updates, and deletion.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info};

use crate::darts::{Dart, DartPatch, NewDart, Page};
use crate::error::{Error, Result};

use schema::DART_COLUMNS;

/// Path reported for in-memory databases.
const IN_MEMORY: &str = ":memory:";

/// Storage engine for darts records.
///
/// Wraps a single `SQLite` connection. The type is `Send` but not `Sync`;
/// share it between tasks behind a mutex.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(IN_MEMORY),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(IN_MEMORY),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check that the database answers queries.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is unusable.
    pub fn ping(&self) -> Result<()> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert a new record and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for invalid fields, [`Error::Conflict`]
    /// if the username is taken, or a database error.
    pub fn insert(&self, dart: &NewDart) -> Result<Dart> {
        dart.validate()?;
        let now = timestamp_now();

        self.conn
            .execute(
                r"
                INSERT INTO darts (username, game, game_type, throws, score, create_date, update_date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                ",
                params![
                    dart.username,
                    dart.game,
                    dart.game_type,
                    dart.throws,
                    dart.score,
                    now,
                ],
            )
            .map_err(|err| write_error(err, &dart.username))?;

        let id = self.conn.last_insert_rowid();
        debug!(id, username = %dart.username, "Inserted darts record");
        self.get(id)?.ok_or(Error::NotFound { id })
    }

    /// Get a record by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<Dart>> {
        let dart = self
            .conn
            .query_row(
                &format!("SELECT {DART_COLUMNS} FROM darts WHERE id = ?1"),
                [id],
                row_to_dart,
            )
            .optional()?;
        Ok(dart)
    }

    /// List one page of records in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self, page: Page) -> Result<Vec<Dart>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DART_COLUMNS} FROM darts ORDER BY id ASC LIMIT ?1 OFFSET ?2"
        ))?;

        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        let darts = stmt
            .query_map(params![i64::from(page.limit()), offset], row_to_dart)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(darts)
    }

    /// Overwrite every user field of a record.
    ///
    /// Returns `None` if no record has the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for invalid fields, [`Error::Conflict`]
    /// if the new username belongs to another record, or a database error.
    pub fn replace(&self, id: i64, dart: &NewDart) -> Result<Option<Dart>> {
        dart.validate()?;
        let now = timestamp_now();

        let affected = self
            .conn
            .execute(
                r"
                UPDATE darts
                SET username = ?1, game = ?2, game_type = ?3, throws = ?4, score = ?5,
                    update_date = ?6
                WHERE id = ?7
                ",
                params![
                    dart.username,
                    dart.game,
                    dart.game_type,
                    dart.throws,
                    dart.score,
                    now,
                    id,
                ],
            )
            .map_err(|err| write_error(err, &dart.username))?;

        if affected == 0 {
            return Ok(None);
        }
        debug!(id, "Updated darts record");
        self.get(id)
    }

    /// Apply a partial update to a record.
    ///
    /// Returns `None` if no record has the given id.
    ///
    /// # Errors
    ///
    /// Same as [`Storage::replace`], checked against the merged record.
    pub fn patch(&self, id: i64, patch: &DartPatch) -> Result<Option<Dart>> {
        let Some(existing) = self.get(id)? else {
            return Ok(None);
        };
        self.replace(id, &patch.apply_to(&existing))
    }

    /// Delete a record by id.
    ///
    /// Returns `true` if a record was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM darts WHERE id = ?1", [id])?;
        if affected > 0 {
            debug!(id, "Deleted darts record");
        }
        Ok(affected > 0)
    }

    /// Count all stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM darts", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_records = self.count()?;

        let last_update: Option<String> = self
            .conn
            .query_row("SELECT MAX(update_date) FROM darts", [], |row| row.get(0))?;
        let last_update = last_update
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.as_os_str() == IN_MEMORY {
            0
        } else {
            std::fs::metadata(&self.path).map_or(0, |m| m.len())
        };

        Ok(StorageStats {
            total_records,
            last_update,
            db_size_bytes,
            schema_version: migrations::schema_version(&self.conn)?,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of records stored.
    pub total_records: i64,
    /// Most recent `update_date` across all records.
    pub last_update: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
    /// Applied schema version.
    pub schema_version: i32,
}

/// Map a failed write, turning the username uniqueness violation into a conflict.
fn write_error(err: rusqlite::Error, username: &str) -> Error {
    if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        Error::conflict(format!("username '{username}' is already taken"))
    } else {
        err.into()
    }
}

/// Current time as fixed-width RFC 3339, so stored values sort as text.
fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_dart(row: &Row) -> rusqlite::Result<Dart> {
    Ok(Dart {
        id: row.get(0)?,
        username: row.get(1)?,
        game: row.get(2)?,
        game_type: row.get(3)?,
        throws: row.get(4)?,
        score: row.get(5)?,
        create_date: parse_timestamp(row, 6)?,
        update_date: parse_timestamp(row, 7)?,
    })
}

fn parse_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
