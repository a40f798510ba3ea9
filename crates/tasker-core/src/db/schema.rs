//! Canonical `SQLite` schema for the task tracker.
//!
//! - `projects` and `tasks` hold the primary records
//! - `tags` is a global, unique name table; `task_tags` links it to tasks
//! - `tasks_fts` is an external-content FTS5 index over task title and
//!   description, kept in sync by triggers
//!
//! `tasks.project_id` deliberately carries no foreign key: deleting a project
//! leaves its tasks pointing at the old id.

use rusqlite::{Connection, types::Type};

use crate::error::StoreError;

/// Schema version recorded in `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    description TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT NOT NULL DEFAULT '',
    priority TEXT NOT NULL DEFAULT 'medium'
        CHECK (priority IN ('low', 'medium', 'high')),
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'in_progress', 'completed', 'blocked')),
    project_id INTEGER,
    due_date TEXT CHECK (due_date IS NULL OR date(due_date) IS due_date),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0)
);

CREATE TABLE IF NOT EXISTS task_tags (
    task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (task_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_tasks_status
    ON tasks(status);

CREATE INDEX IF NOT EXISTS idx_tasks_priority_due
    ON tasks(priority, due_date);

CREATE INDEX IF NOT EXISTS idx_tasks_project
    ON tasks(project_id);

CREATE INDEX IF NOT EXISTS idx_tasks_due_date
    ON tasks(due_date);

CREATE INDEX IF NOT EXISTS idx_task_tags_tag
    ON task_tags(tag_id, task_id);

CREATE VIRTUAL TABLE IF NOT EXISTS tasks_fts USING fts5(
    title,
    description,
    content='tasks',
    content_rowid='id',
    tokenize='porter unicode61',
    prefix='2 3'
);

CREATE TRIGGER IF NOT EXISTS tasks_ai
AFTER INSERT ON tasks
BEGIN
    INSERT INTO tasks_fts(rowid, title, description)
    VALUES (new.id, new.title, new.description);
END;

CREATE TRIGGER IF NOT EXISTS tasks_au
AFTER UPDATE OF title, description ON tasks
BEGIN
    INSERT INTO tasks_fts(tasks_fts, rowid, title, description)
    VALUES ('delete', old.id, old.title, old.description);

    INSERT INTO tasks_fts(rowid, title, description)
    VALUES (new.id, new.title, new.description);
END;

CREATE TRIGGER IF NOT EXISTS tasks_ad
AFTER DELETE ON tasks
BEGIN
    INSERT INTO tasks_fts(tasks_fts, rowid, title, description)
    VALUES ('delete', old.id, old.title, old.description);
END;
";

/// Indexes expected by the list, filter and overdue query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_tasks_status",
    "idx_tasks_priority_due",
    "idx_tasks_project",
    "idx_tasks_due_date",
    "idx_task_tags_tag",
];

/// Read `PRAGMA user_version` and convert it to a Rust `u32`.
///
/// # Errors
///
/// Returns an error if querying `SQLite` fails or the version value cannot be
/// represented as `u32`.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(version).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(error))
    })
}

/// Apply the schema in one transaction and stamp [`SCHEMA_VERSION`].
///
/// Every statement is `IF NOT EXISTS`, so applying to an already current
/// database changes nothing.
///
/// # Errors
///
/// Returns [`StoreError::UnsupportedSchema`] if the file was stamped by a
/// newer version, or [`StoreError::Schema`] if any statement fails.
pub fn apply(conn: &mut Connection) -> Result<(), StoreError> {
    let found = current_schema_version(conn).map_err(StoreError::Schema)?;
    if found > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchema {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction().map_err(StoreError::Schema)?;
    tx.execute_batch(SCHEMA_SQL).map_err(StoreError::Schema)?;
    tx.pragma_update(None, "user_version", i64::from(SCHEMA_VERSION))
        .map_err(StoreError::Schema)?;
    tx.commit().map_err(StoreError::Schema)
}
