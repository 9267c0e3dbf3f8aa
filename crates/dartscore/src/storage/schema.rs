//! `SQLite` schema definitions for dartscore.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the darts table.
pub const CREATE_DARTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS darts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    game TEXT NOT NULL,
    game_type TEXT NOT NULL,
    throws INTEGER,
    score INTEGER,
    create_date TEXT NOT NULL,
    update_date TEXT NOT NULL
)
";

/// SQL statement to create an index on `game` for filtering.
pub const CREATE_GAME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_darts_game ON darts(game)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DARTS_TABLE,
    CREATE_GAME_INDEX,
    CREATE_METADATA_TABLE,
];

/// Column list shared by every query that reads full records.
pub const DART_COLUMNS: &str =
    "id, username, game, game_type, throws, score, create_date, update_date";
