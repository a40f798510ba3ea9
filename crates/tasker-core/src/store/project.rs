use anyhow::{Context, anyhow};
use rusqlite::params;
use tracing::debug;

use super::{PROJECT_COLUMNS, fetch_project, recover, row_to_project};
use crate::db::Database;
use crate::model::{Project, ProjectUpdate, timestamp};

/// CRUD for projects. Deleting a project leaves its tasks untouched.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    db: Database,
}

impl ProjectStore {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a project and return the stored row.
    pub fn create(&self, name: &str, description: &str) -> Option<Project> {
        let result = self.db.write(|tx| {
            let now = timestamp::format(&timestamp::now());
            tx.execute(
                "INSERT INTO projects (name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![name, description, now],
            )
            .with_context(|| format!("insert project '{name}'"))?;
            let id = tx.last_insert_rowid();
            fetch_project(tx, id)?.ok_or_else(|| anyhow!("project {id} vanished after insert"))
        });

        let project = recover("create_project", result)?;
        debug!(project_id = project.id, name = %project.name, "project created");
        Some(project)
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<Project> {
        recover("get_project", self.db.read(|tx| fetch_project(tx, id))).flatten()
    }

    /// All projects ordered by name, then id.
    #[must_use]
    pub fn list(&self) -> Vec<Project> {
        let result = self.db.read(|tx| {
            let mut stmt = tx
                .prepare(&format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects p ORDER BY p.name ASC, p.id ASC"
                ))
                .context("prepare list_projects")?;
            let rows = stmt
                .query_map([], row_to_project)
                .context("execute list_projects")?;
            let mut projects = Vec::new();
            for row in rows {
                projects.push(row.context("read project row")?);
            }
            Ok(projects)
        });
        recover("list_projects", result).unwrap_or_default()
    }

    /// Apply the present fields. An empty update returns the current row
    /// without touching `updated_at`.
    pub fn update(&self, id: i64, update: &ProjectUpdate) -> Option<Project> {
        let result = self.db.write(|tx| {
            if update.is_empty() {
                return fetch_project(tx, id);
            }
            let now = timestamp::format(&timestamp::now());
            let changed = tx
                .execute(
                    "UPDATE projects
                     SET name = COALESCE(?1, name),
                         description = COALESCE(?2, description),
                         updated_at = ?3
                     WHERE id = ?4",
                    params![update.name, update.description, now, id],
                )
                .with_context(|| format!("update project {id}"))?;
            if changed == 0 {
                return Ok(None);
            }
            fetch_project(tx, id)
        });

        let project = recover("update_project", result).flatten()?;
        debug!(project_id = id, "project updated");
        Some(project)
    }

    /// Delete a project. Its tasks keep their `project_id`.
    pub fn delete(&self, id: i64) -> bool {
        let result = self.db.write(|tx| {
            tx.execute("DELETE FROM projects WHERE id = ?1", [id])
                .with_context(|| format!("delete project {id}"))
        });
        let deleted = recover("delete_project", result).is_some_and(|n| n > 0);
        if deleted {
            debug!(project_id = id, "project deleted");
        }
        deleted
    }
}
