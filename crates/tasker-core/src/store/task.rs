use anyhow::{Context, anyhow};
use rusqlite::{params, params_from_iter, types::Value};
use tracing::{debug, warn};

use super::{fetch_task, project_exists, recover};
use crate::db::Database;
use crate::model::{NewTask, Task, TaskUpdate, date, timestamp};

/// CRUD for tasks. Reads always come back with the task's tags.
#[derive(Debug, Clone)]
pub struct TaskStore {
    db: Database,
}

impl TaskStore {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a task and return it with its (empty) tag list.
    ///
    /// Absent when `project_id` names a project that does not exist or the
    /// insert fails.
    pub fn create(&self, new: &NewTask) -> Option<Task> {
        let result = self.db.write(|tx| {
            if let Some(project_id) = new.project_id
                && !project_exists(tx, project_id)?
            {
                warn!(project_id, title = %new.title, "task references unknown project");
                return Ok(None);
            }

            let now = timestamp::format(&timestamp::now());
            tx.execute(
                "INSERT INTO tasks
                    (title, description, priority, status, project_id, due_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    new.title,
                    new.description,
                    new.priority,
                    new.status,
                    new.project_id,
                    new.due_date.map(date::format),
                    now,
                ],
            )
            .with_context(|| format!("insert task '{}'", new.title))?;

            let id = tx.last_insert_rowid();
            fetch_task(tx, id)?
                .map(Some)
                .ok_or_else(|| anyhow!("task {id} vanished after insert"))
        });

        let task = recover("create_task", result).flatten()?;
        debug!(task_id = task.id, title = %task.title, "task created");
        Some(task)
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<Task> {
        recover("get_task", self.db.read(|tx| fetch_task(tx, id))).flatten()
    }

    /// Apply the present fields and return the refreshed task. An empty
    /// update returns the current task without touching `updated_at`.
    pub fn update(&self, id: i64, update: &TaskUpdate) -> Option<Task> {
        let result = self.db.write(|tx| {
            if update.is_empty() {
                return fetch_task(tx, id);
            }

            let (assignments, mut values) = update_assignments(update);
            values.push(Value::Text(timestamp::format(&timestamp::now())));
            values.push(Value::Integer(id));
            let sql = format!(
                "UPDATE tasks SET {assignments}, updated_at = ?{} WHERE id = ?{}",
                values.len() - 1,
                values.len()
            );

            let changed = tx
                .execute(&sql, params_from_iter(values))
                .with_context(|| format!("update task {id}"))?;
            if changed == 0 {
                return Ok(None);
            }
            fetch_task(tx, id)
        });

        let task = recover("update_task", result).flatten()?;
        debug!(task_id = id, "task updated");
        Some(task)
    }

    /// Delete a task and its tag associations.
    pub fn delete(&self, id: i64) -> bool {
        let result = self.db.write(|tx| {
            tx.execute("DELETE FROM task_tags WHERE task_id = ?1", [id])
                .with_context(|| format!("delete tag links for task {id}"))?;
            tx.execute("DELETE FROM tasks WHERE id = ?1", [id])
                .with_context(|| format!("delete task {id}"))
        });
        let deleted = recover("delete_task", result).is_some_and(|n| n > 0);
        if deleted {
            debug!(task_id = id, "task deleted");
        }
        deleted
    }
}

/// Build the `SET` list for the present fields, numbering parameters from 1.
fn update_assignments(update: &TaskUpdate) -> (String, Vec<Value>) {
    let mut columns: Vec<&'static str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(title) = &update.title {
        columns.push("title");
        values.push(Value::Text(title.clone()));
    }
    if let Some(description) = &update.description {
        columns.push("description");
        values.push(Value::Text(description.clone()));
    }
    if let Some(status) = update.status {
        columns.push("status");
        values.push(Value::Text(status.as_str().to_owned()));
    }
    if let Some(priority) = update.priority {
        columns.push("priority");
        values.push(Value::Text(priority.as_str().to_owned()));
    }
    if let Some(due_date) = update.due_date {
        columns.push("due_date");
        values.push(due_date.map_or(Value::Null, |d| Value::Text(date::format(d))));
    }

    let assignments = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| format!("{column} = ?{}", idx + 1))
        .collect::<Vec<_>>()
        .join(", ");
    (assignments, values)
}
