//! Record stores: CRUD for projects, tasks and tag associations.
//!
//! Every public store operation runs in one transaction on the shared
//! [`Database`](crate::db::Database) and never returns a storage error.
//! Faults are logged with [`recover`] and folded into `None`, `false` or an
//! empty list.

pub mod project;
pub mod tag;
pub mod task;

pub use project::ProjectStore;
pub use tag::TagStore;
pub use task::TaskStore;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, types::Type};
use tracing::error;

use crate::model::{Project, Task, date, timestamp};

/// Column list matching [`row_to_task`], for queries aliasing `tasks` as `t`.
pub(crate) const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.priority, t.status, \
     t.project_id, t.due_date, t.created_at, t.updated_at";

pub(crate) const PROJECT_COLUMNS: &str = "p.id, p.name, p.description, p.created_at, p.updated_at";

/// Log a storage fault for `operation` and discard it.
pub(crate) fn recover<T>(operation: &'static str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!(operation, error = %format!("{err:#}"), "storage fault");
            None
        }
    }
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    timestamp::parse(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|value| {
        date::parse(&value)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Map a row selected with [`TASK_COLUMNS`]. Tags are left empty.
pub(crate) fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        priority: row.get(3)?,
        status: row.get(4)?,
        project_id: row.get(5)?,
        due_date: date_at(row, 6)?,
        created_at: timestamp_at(row, 7)?,
        updated_at: timestamp_at(row, 8)?,
        tags: Vec::new(),
    })
}

pub(crate) fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
        updated_at: timestamp_at(row, 4)?,
    })
}

/// Fetch one task with its tags.
pub(crate) fn fetch_task(conn: &Connection, id: i64) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1"),
            [id],
            row_to_task,
        )
        .optional()
        .with_context(|| format!("load task {id}"))?;

    let Some(mut task) = task else {
        return Ok(None);
    };
    task.tags = tag::tags_for_task_in(conn, id)?;
    Ok(Some(task))
}

pub(crate) fn fetch_project(conn: &Connection, id: i64) -> Result<Option<Project>> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?1"),
        [id],
        row_to_project,
    )
    .optional()
    .with_context(|| format!("load project {id}"))
}

pub(crate) fn project_exists(conn: &Connection, id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )
    .with_context(|| format!("check project {id} exists"))
}

/// Fill in `tags` for every task with one batched lookup.
pub(crate) fn attach_tags(conn: &Connection, tasks: &mut [Task]) -> Result<()> {
    if tasks.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
    let mut by_task = tag::load_tags(conn, &ids)?;
    for task in tasks.iter_mut() {
        task.tags = by_task.remove(&task.id).unwrap_or_default();
    }
    Ok(())
}
