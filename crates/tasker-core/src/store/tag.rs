use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::collections::HashMap;
use tracing::debug;

use super::recover;
use crate::db::Database;
use crate::model::Tag;

/// Maximum number of task ids bound into one `IN (...)` lookup.
pub(crate) const TAG_BATCH_SIZE: usize = 500;

/// Global tags and their many-to-many link to tasks.
#[derive(Debug, Clone)]
pub struct TagStore {
    db: Database,
}

impl TagStore {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Attach `name` to a task, creating the tag if needed.
    ///
    /// Re-adding an existing pair succeeds without a second link. False for
    /// a missing task, a blank name, or a storage fault.
    pub fn add_tag(&self, task_id: i64, name: &str) -> bool {
        if name.trim().is_empty() {
            return false;
        }

        let result = self.db.write(|tx| {
            let task_exists: bool = tx
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
                    [task_id],
                    |row| row.get(0),
                )
                .with_context(|| format!("check task {task_id} exists"))?;
            if !task_exists {
                return Ok(false);
            }

            let tag_id = get_or_create_tag(tx, name)?;
            tx.execute(
                "INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?1, ?2)",
                params![task_id, tag_id],
            )
            .with_context(|| format!("link tag '{name}' to task {task_id}"))?;
            Ok(true)
        });

        let added = recover("add_tag", result).unwrap_or(false);
        if added {
            debug!(task_id, tag = name, "tag added");
        }
        added
    }

    /// Detach `name` from a task.
    ///
    /// False only when no tag has that name; detaching a pair that was never
    /// linked still reports true.
    pub fn remove_tag(&self, task_id: i64, name: &str) -> bool {
        let result = self.db.write(|tx| {
            let Some(tag_id) = find_tag(tx, name)? else {
                return Ok(false);
            };
            tx.execute(
                "DELETE FROM task_tags WHERE task_id = ?1 AND tag_id = ?2",
                params![task_id, tag_id],
            )
            .with_context(|| format!("unlink tag '{name}' from task {task_id}"))?;
            Ok(true)
        });

        let removed = recover("remove_tag", result).unwrap_or(false);
        if removed {
            debug!(task_id, tag = name, "tag removed");
        }
        removed
    }

    /// All tags ordered by name.
    #[must_use]
    pub fn list_tags(&self) -> Vec<Tag> {
        let result = self.db.read(|tx| {
            let mut stmt = tx
                .prepare("SELECT id, name FROM tags ORDER BY name ASC, id ASC")
                .context("prepare list_tags")?;
            let rows = stmt
                .query_map([], row_to_tag)
                .context("execute list_tags")?;
            let mut tags = Vec::new();
            for row in rows {
                tags.push(row.context("read tag row")?);
            }
            Ok(tags)
        });
        recover("list_tags", result).unwrap_or_default()
    }

    /// Tags linked to one task, ordered by name.
    #[must_use]
    pub fn tags_for_task(&self, task_id: i64) -> Vec<Tag> {
        recover(
            "tags_for_task",
            self.db.read(|tx| tags_for_task_in(tx, task_id)),
        )
        .unwrap_or_default()
    }
}

fn row_to_tag(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn find_tag(conn: &Connection, name: &str) -> Result<Option<i64>> {
    conn.query_row("SELECT id FROM tags WHERE name = ?1", [name], |row| {
        row.get(0)
    })
    .optional()
    .with_context(|| format!("look up tag '{name}'"))
}

/// Return the id of the tag named exactly `name`, inserting it if absent.
fn get_or_create_tag(conn: &Connection, name: &str) -> Result<i64> {
    if let Some(id) = find_tag(conn, name)? {
        return Ok(id);
    }
    conn.execute("INSERT INTO tags (name) VALUES (?1)", [name])
        .with_context(|| format!("insert tag '{name}'"))?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn tags_for_task_in(conn: &Connection, task_id: i64) -> Result<Vec<Tag>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT g.id, g.name
             FROM task_tags tt
             INNER JOIN tags g ON g.id = tt.tag_id
             WHERE tt.task_id = ?1
             ORDER BY g.name ASC, g.id ASC",
        )
        .context("prepare tags_for_task")?;
    let rows = stmt
        .query_map([task_id], row_to_tag)
        .with_context(|| format!("load tags for task {task_id}"))?;
    let mut tags = Vec::new();
    for row in rows {
        tags.push(row.context("read tag row")?);
    }
    Ok(tags)
}

/// Load tags for many tasks at once, keyed by task id. Tasks without tags
/// are absent from the map.
pub(crate) fn load_tags(conn: &Connection, task_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>> {
    let mut by_task: HashMap<i64, Vec<Tag>> = HashMap::new();

    for chunk in task_ids.chunks(TAG_BATCH_SIZE) {
        let placeholders = (1..=chunk.len())
            .map(|idx| format!("?{idx}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT tt.task_id, g.id, g.name
             FROM task_tags tt
             INNER JOIN tags g ON g.id = tt.tag_id
             WHERE tt.task_id IN ({placeholders})
             ORDER BY tt.task_id, g.name ASC, g.id ASC"
        );

        let mut stmt = conn.prepare(&sql).context("prepare batched tag lookup")?;
        let rows = stmt
            .query_map(params_from_iter(chunk), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    Tag {
                        id: row.get(1)?,
                        name: row.get(2)?,
                    },
                ))
            })
            .context("execute batched tag lookup")?;
        for row in rows {
            let (task_id, tag) = row.context("read batched tag row")?;
            by_task.entry(task_id).or_default().push(tag);
        }
    }

    Ok(by_task)
}
