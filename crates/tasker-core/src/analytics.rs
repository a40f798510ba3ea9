//! Aggregate counts and overdue detection.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::Database;
use crate::model::{Task, date};
use crate::store::{TASK_COLUMNS, attach_tags, recover, row_to_task};

/// Task counts across the whole store.
///
/// `in_progress` is everything neither completed nor pending, so it includes
/// blocked tasks; `blocked` is reported separately for detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskStatistics {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub blocked: u64,
    pub high_priority: u64,
    /// Percentage of tasks completed; 0 when there are no tasks.
    pub completion_rate: f64,
}

impl TaskStatistics {
    const fn from_counts(total: u64, completed: u64, pending: u64, blocked: u64, high_priority: u64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let completion_rate = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        Self {
            total,
            completed,
            pending,
            in_progress: total.saturating_sub(completed).saturating_sub(pending),
            blocked,
            high_priority,
            completion_rate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Analytics {
    db: Database,
}

impl Analytics {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn statistics(&self) -> Option<TaskStatistics> {
        recover("task_statistics", self.db.read(|tx| count_tasks(tx)))
    }

    /// Incomplete tasks due before today's local date.
    #[must_use]
    pub fn overdue(&self) -> Vec<Task> {
        self.overdue_as_of(Local::now().date_naive())
    }

    /// Incomplete tasks due strictly before `today`, earliest first.
    #[must_use]
    pub fn overdue_as_of(&self, today: NaiveDate) -> Vec<Task> {
        recover(
            "overdue_tasks",
            self.db.read(|tx| overdue_tasks(tx, today)),
        )
        .unwrap_or_default()
    }
}

fn count_tasks(conn: &Connection) -> Result<TaskStatistics> {
    let (total, completed, pending, blocked, high_priority): (i64, i64, i64, i64, i64) = conn
        .query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(status = 'completed'), 0),
                    COALESCE(SUM(status = 'pending'), 0),
                    COALESCE(SUM(status = 'blocked'), 0),
                    COALESCE(SUM(priority = 'high'), 0)
             FROM tasks",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .context("count tasks by status")?;

    let as_count = |value: i64| u64::try_from(value).unwrap_or(0);
    Ok(TaskStatistics::from_counts(
        as_count(total),
        as_count(completed),
        as_count(pending),
        as_count(blocked),
        as_count(high_priority),
    ))
}

fn overdue_tasks(conn: &Connection, today: NaiveDate) -> Result<Vec<Task>> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t
             WHERE t.due_date IS NOT NULL
               AND t.due_date < ?1
               AND t.status != 'completed'
             ORDER BY t.due_date ASC, t.id ASC"
        ))
        .context("prepare overdue query")?;
    let rows = stmt
        .query_map([date::format(today)], row_to_task)
        .context("execute overdue query")?;

    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row.context("read overdue row")?);
    }
    attach_tags(conn, &mut tasks)?;
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewTask, Priority, Status, TaskUpdate};
    use crate::store::{TagStore, TaskStore};
    use chrono::Days;

    fn setup() -> (TaskStore, TagStore, Analytics) {
        let db = Database::open_in_memory().expect("open");
        (
            TaskStore::new(db.clone()),
            TagStore::new(db.clone()),
            Analytics::new(db),
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).expect("valid date")
    }

    #[test]
    fn empty_store_has_zero_completion_rate() {
        let (_, _, analytics) = setup();
        let stats = analytics.statistics().expect("stats");
        assert_eq!(stats.total, 0);
        assert!(stats.completion_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn counts_partition_the_total() {
        let (tasks, _, analytics) = setup();
        for status in [
            Status::Pending,
            Status::Pending,
            Status::InProgress,
            Status::Blocked,
            Status::Completed,
        ] {
            tasks
                .create(&NewTask::new("t").status(status).priority(Priority::High))
                .expect("create");
        }
        tasks.create(&NewTask::new("low")).expect("create");

        let stats = analytics.statistics().expect("stats");
        assert_eq!(stats.total, 6);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.in_progress, 2);
        assert_eq!(stats.blocked, 1);
        assert_eq!(stats.high_priority, 5);
        assert_eq!(stats.completed + stats.pending + stats.in_progress, stats.total);
        assert!((stats.completion_rate - 100.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn overdue_is_strictly_before_today_and_incomplete() {
        let (tasks, tags, analytics) = setup();
        let yesterday = tasks.create(&NewTask::new("late").due(day(9))).expect("create");
        let earlier = tasks
            .create(&NewTask::new("later still").status(Status::Blocked).due(day(3)))
            .expect("create");
        tasks.create(&NewTask::new("today").due(day(10))).expect("create");
        tasks.create(&NewTask::new("undated")).expect("create");
        let done = tasks.create(&NewTask::new("done").due(day(1))).expect("create");
        tasks
            .update(
                done.id,
                &TaskUpdate {
                    status: Some(Status::Completed),
                    ..TaskUpdate::default()
                },
            )
            .expect("complete");
        assert!(tags.add_tag(yesterday.id, "followup"));

        let overdue = analytics.overdue_as_of(day(10));
        let ids: Vec<i64> = overdue.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![earlier.id, yesterday.id]);
        assert_eq!(overdue[1].tag_names(), vec!["followup"]);
        assert!(overdue.iter().all(|t| t.is_overdue_on(day(10))));
    }

    #[test]
    fn overdue_uses_local_today() {
        let (tasks, _, analytics) = setup();
        let today = Local::now().date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).expect("yesterday");
        let late = tasks.create(&NewTask::new("late").due(yesterday)).expect("create");
        tasks.create(&NewTask::new("due today").due(today)).expect("create");

        let ids: Vec<i64> = analytics.overdue().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![late.id]);
    }
}
