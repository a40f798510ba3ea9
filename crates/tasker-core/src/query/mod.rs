//! Read paths over tasks: paginated listing, full-text search and filtering.
//!
//! Every result is enriched with its tags via one batched lookup per result
//! set.

pub mod filter;

pub use filter::{FilterError, FilterSql, Predicate, TaskFilter};

use anyhow::{Context, Result};
use rusqlite::{Connection, params_from_iter, types::Value};
use std::collections::{HashMap, HashSet};

use crate::db::{Database, fts};
use crate::model::Task;
use crate::store::tag::TAG_BATCH_SIZE;
use crate::store::{TASK_COLUMNS, attach_tags, recover, row_to_task};

/// High priority first, then due date ascending with undated tasks last,
/// then id.
pub const TASK_ORDER: &str = "ORDER BY CASE WHEN t.priority = 'high' THEN 0 ELSE 1 END, \
     t.due_date IS NULL, t.due_date ASC, t.id ASC";

/// Pagination window for [`QueryEngine::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone)]
pub struct QueryEngine {
    db: Database,
    default_limit: u32,
}

impl QueryEngine {
    #[must_use]
    pub const fn new(db: Database, default_limit: u32) -> Self {
        Self { db, default_limit }
    }

    #[must_use]
    pub const fn default_limit(&self) -> u32 {
        self.default_limit
    }

    /// One page of tasks in canonical order. `limit` falls back to the
    /// configured default page size.
    #[must_use]
    pub fn list(&self, limit: Option<u32>, offset: u32) -> Vec<Task> {
        let page = Page {
            limit: limit.unwrap_or(self.default_limit),
            offset,
        };
        let result = self
            .db
            .read(|tx| select_tasks(tx, &TaskFilter::new(), Some(page)));
        recover("list_tasks", result).unwrap_or_default()
    }

    /// Tasks matching an FTS5 query, best match first. Empty when nothing
    /// matches or the query cannot be parsed.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Task> {
        let result = self.db.read(|tx| {
            let hits = fts::search_bm25(tx, query)?;
            let ids: Vec<i64> = hits.iter().map(|hit| hit.task_id).collect();
            tasks_by_ids(tx, &ids)
        });
        recover("search_tasks", result).unwrap_or_default()
    }

    /// Every task satisfying all predicates, in canonical order. An empty
    /// filter returns every task without pagination.
    #[must_use]
    pub fn filter(&self, filter: &TaskFilter) -> Vec<Task> {
        let result = self.db.read(|tx| select_tasks(tx, filter, None));
        recover("filter_tasks", result).unwrap_or_default()
    }

    #[must_use]
    pub fn project_tasks(&self, project_id: i64) -> Vec<Task> {
        self.filter(&TaskFilter::new().project(project_id))
    }
}

/// Select tasks matching `filter` in [`TASK_ORDER`], de-duplicated by id and
/// enriched with tags.
fn select_tasks(
    conn: &Connection,
    filter: &TaskFilter,
    page: Option<Page>,
) -> Result<Vec<Task>> {
    let compiled = filter.to_sql();
    let where_clause = compiled.where_clause();
    let FilterSql {
        joins, mut params, ..
    } = compiled;

    let limit_clause = page.map_or_else(String::new, |page| {
        params.push(Value::Integer(i64::from(page.limit)));
        params.push(Value::Integer(i64::from(page.offset)));
        format!(" LIMIT ?{} OFFSET ?{}", params.len() - 1, params.len())
    });

    let sql =
        format!("SELECT {TASK_COLUMNS} FROM tasks t{joins}{where_clause} {TASK_ORDER}{limit_clause}");
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare task query: {sql}"))?;
    let rows = stmt
        .query_map(params_from_iter(params), row_to_task)
        .context("execute task query")?;

    let mut seen = HashSet::new();
    let mut tasks = Vec::new();
    for row in rows {
        let task = row.context("read task row")?;
        if seen.insert(task.id) {
            tasks.push(task);
        }
    }

    attach_tags(conn, &mut tasks)?;
    Ok(tasks)
}

/// Load tasks for `ids`, preserving the order of `ids`. Unknown ids are
/// skipped.
fn tasks_by_ids(conn: &Connection, ids: &[i64]) -> Result<Vec<Task>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_id: HashMap<i64, Task> = HashMap::with_capacity(ids.len());
    for chunk in ids.chunks(TAG_BATCH_SIZE) {
        let placeholders = (1..=chunk.len())
            .map(|idx| format!("?{idx}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id IN ({placeholders})");
        let mut stmt = conn.prepare(&sql).context("prepare task lookup by id")?;
        let rows = stmt
            .query_map(params_from_iter(chunk), row_to_task)
            .context("execute task lookup by id")?;
        for row in rows {
            let task = row.context("read task row")?;
            by_id.insert(task.id, task);
        }
    }

    let mut seen = HashSet::new();
    let mut tasks: Vec<Task> = ids
        .iter()
        .filter(|id| seen.insert(**id))
        .filter_map(|id| by_id.remove(id))
        .collect();
    attach_tags(conn, &mut tasks)?;
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewTask, Priority, Status};
    use crate::store::{ProjectStore, TagStore, TaskStore};
    use chrono::NaiveDate;

    struct Fixture {
        projects: ProjectStore,
        tasks: TaskStore,
        tags: TagStore,
        query: QueryEngine,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().expect("open");
        Fixture {
            projects: ProjectStore::new(db.clone()),
            tasks: TaskStore::new(db.clone()),
            tags: TagStore::new(db.clone()),
            query: QueryEngine::new(db, 100),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).expect("valid date")
    }

    fn add(f: &Fixture, new: NewTask) -> i64 {
        f.tasks.create(&new).expect("create task").id
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn list_orders_high_first_then_due_date_nulls_last_then_id() {
        let f = fixture();
        let low_undated = add(&f, NewTask::new("a").priority(Priority::Low));
        let medium_late = add(&f, NewTask::new("b").due(day(20)));
        let high_undated = add(&f, NewTask::new("c").priority(Priority::High));
        let low_early = add(&f, NewTask::new("d").priority(Priority::Low).due(day(2)));
        let high_late = add(&f, NewTask::new("e").priority(Priority::High).due(day(25)));
        let high_early = add(&f, NewTask::new("f").priority(Priority::High).due(day(1)));
        let medium_undated = add(&f, NewTask::new("g"));

        assert_eq!(
            ids(&f.query.list(None, 0)),
            vec![
                high_early,
                high_late,
                high_undated,
                low_early,
                medium_late,
                low_undated,
                medium_undated,
            ]
        );
    }

    #[test]
    fn list_paginates() {
        let f = fixture();
        let all: Vec<i64> = (0..5).map(|i| add(&f, NewTask::new(format!("t{i}")))).collect();

        assert_eq!(ids(&f.query.list(Some(2), 0)), all[..2].to_vec());
        assert_eq!(ids(&f.query.list(Some(2), 2)), all[2..4].to_vec());
        assert_eq!(ids(&f.query.list(Some(2), 4)), all[4..].to_vec());
        assert!(f.query.list(Some(2), 10).is_empty());
    }

    #[test]
    fn list_uses_default_page_size() {
        let db = Database::open_in_memory().expect("open");
        let tasks = TaskStore::new(db.clone());
        for i in 0..4 {
            tasks.create(&NewTask::new(format!("t{i}"))).expect("create");
        }
        let query = QueryEngine::new(db, 3);
        assert_eq!(query.list(None, 0).len(), 3);
        assert_eq!(query.list(Some(10), 0).len(), 4);
    }

    #[test]
    fn list_results_carry_tags() {
        let f = fixture();
        let tagged = add(&f, NewTask::new("tagged"));
        let bare = add(&f, NewTask::new("bare"));
        assert!(f.tags.add_tag(tagged, "b"));
        assert!(f.tags.add_tag(tagged, "a"));

        let listed = f.query.list(None, 0);
        let by_id: HashMap<i64, &Task> = listed.iter().map(|t| (t.id, t)).collect();
        assert_eq!(by_id[&tagged].tag_names(), vec!["a", "b"]);
        assert!(by_id[&bare].tags.is_empty());
    }

    #[test]
    fn filter_composes_as_intersection() {
        let f = fixture();
        let pending_high = add(&f, NewTask::new("a").priority(Priority::High));
        let pending_low = add(&f, NewTask::new("b").priority(Priority::Low));
        let done_high = add(
            &f,
            NewTask::new("c")
                .priority(Priority::High)
                .status(Status::Completed),
        );

        let pending = ids(&f.query.filter(&TaskFilter::new().status(Status::Pending)));
        let high = ids(&f.query.filter(&TaskFilter::new().priority(Priority::High)));
        let both = ids(&f.query.filter(
            &TaskFilter::new()
                .status(Status::Pending)
                .priority(Priority::High),
        ));

        assert_eq!(pending, vec![pending_high, pending_low]);
        assert_eq!(high, vec![pending_high, done_high]);
        assert_eq!(both, vec![pending_high]);
    }

    #[test]
    fn empty_filter_returns_everything_unpaginated() {
        let db = Database::open_in_memory().expect("open");
        let tasks = TaskStore::new(db.clone());
        for i in 0..5 {
            tasks.create(&NewTask::new(format!("t{i}"))).expect("create");
        }
        let query = QueryEngine::new(db, 2);
        assert_eq!(query.filter(&TaskFilter::new()).len(), 5);
    }

    #[test]
    fn tag_filter_matches_exact_names_without_duplicates() {
        let f = fixture();
        let both = add(&f, NewTask::new("both"));
        let work_only = add(&f, NewTask::new("work"));
        let other = add(&f, NewTask::new("other"));
        assert!(f.tags.add_tag(both, "work"));
        assert!(f.tags.add_tag(both, "urgent"));
        assert!(f.tags.add_tag(work_only, "work"));
        assert!(f.tags.add_tag(other, "Work"));

        let work = f.query.filter(&TaskFilter::new().tag("work"));
        assert_eq!(ids(&work), vec![both, work_only]);
        assert_eq!(work[0].tag_names(), vec!["urgent", "work"], "all tags returned");

        let work_and_urgent = f.query.filter(&TaskFilter::new().tag("work").tag("urgent"));
        assert_eq!(ids(&work_and_urgent), vec![both]);

        assert!(f.query.filter(&TaskFilter::new().tag("missing")).is_empty());
    }

    #[test]
    fn project_tasks_filters_by_project() {
        let f = fixture();
        let launch = f.projects.create("Launch", "").expect("project");
        let other = f.projects.create("Other", "").expect("project");
        let a = add(&f, NewTask::new("a").project(launch.id));
        add(&f, NewTask::new("b").project(other.id));
        add(&f, NewTask::new("c"));

        assert_eq!(ids(&f.query.project_tasks(launch.id)), vec![a]);
        assert!(f.query.project_tasks(999).is_empty());
    }

    #[test]
    fn search_returns_ranked_tasks_with_tags() {
        let f = fixture();
        let desc = add(&f, NewTask::new("Team sync").description("talk about the invoice"));
        let title = add(&f, NewTask::new("Send invoice"));
        add(&f, NewTask::new("Unrelated"));
        assert!(f.tags.add_tag(title, "billing"));

        let found = f.query.search("invoice");
        assert_eq!(ids(&found), vec![title, desc]);
        assert_eq!(found[0].tag_names(), vec!["billing"]);
    }

    #[test]
    fn search_sees_updates_and_deletes() {
        let f = fixture();
        let id = add(&f, NewTask::new("Paint fence"));
        f.tasks
            .update(
                id,
                &crate::model::TaskUpdate {
                    title: Some("Paint shed".into()),
                    ..Default::default()
                },
            )
            .expect("update");
        assert!(f.query.search("fence").is_empty());
        assert_eq!(ids(&f.query.search("shed")), vec![id]);

        assert!(f.tasks.delete(id));
        assert!(f.query.search("shed").is_empty());
    }

    #[test]
    fn search_hits_beyond_one_batch_all_come_back() {
        let f = fixture();
        let created: HashSet<i64> = (0..TAG_BATCH_SIZE + 7)
            .map(|i| add(&f, NewTask::new(format!("Sweep floor {i}"))))
            .collect();

        let found = f.query.search("sweep");
        assert_eq!(found.len(), created.len());
        assert_eq!(found.iter().map(|t| t.id).collect::<HashSet<_>>(), created);
    }

    #[test]
    fn malformed_search_is_empty() {
        let f = fixture();
        add(&f, NewTask::new("Anything"));
        assert!(f.query.search("\"broken").is_empty());
        assert!(f.query.search("OR").is_empty());
    }
}
