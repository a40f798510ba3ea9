//! Markdown reports assembled from read-only tracker queries.

use chrono::NaiveDate;
use std::fmt::Write as _;

use crate::model::{Priority, Status, Task};
use crate::query::TaskFilter;
use crate::tracker::Tracker;

/// Pending tasks listed in the daily review.
const DAILY_PENDING_LIMIT: usize = 10;

fn due_label(task: &Task) -> String {
    task.due_date
        .map_or_else(|| "none".to_string(), crate::model::date::format)
}

/// Summary counts, overdue tasks and the first pending tasks.
#[must_use]
pub fn daily_review(tracker: &Tracker, today: NaiveDate) -> String {
    let stats = tracker.analytics().statistics().unwrap_or_default();
    let overdue = tracker.analytics().overdue_as_of(today);
    let pending = tracker
        .query()
        .filter(&TaskFilter::new().status(Status::Pending));

    let mut out = String::from("# Daily Task Review\n\n## Summary\n");
    let _ = writeln!(out, "- Total tasks: {}", stats.total);
    let _ = writeln!(out, "- Completed: {}", stats.completed);
    let _ = writeln!(out, "- Pending: {}", stats.pending);
    let _ = writeln!(out, "- Overdue: {}", overdue.len());

    let _ = writeln!(out, "\n## Overdue Tasks ({})", overdue.len());
    for task in &overdue {
        let _ = writeln!(
            out,
            "- [{}] {} (due: {})",
            task.priority,
            task.title,
            due_label(task)
        );
    }

    out.push_str("\n## Today's Pending Tasks\n");
    for task in pending.iter().take(DAILY_PENDING_LIMIT) {
        let _ = writeln!(out, "- [{}] {}", task.priority, task.title);
    }
    out
}

/// Project count, task metrics and per-project task counts.
#[must_use]
pub fn weekly_planning(tracker: &Tracker) -> String {
    let projects = tracker.projects().list();
    let stats = tracker.analytics().statistics().unwrap_or_default();

    let mut out = String::from("# Weekly Planning\n\n## Project Overview\n");
    let _ = writeln!(out, "Projects: {}", projects.len());

    out.push_str("\n## Task Metrics\n");
    let _ = writeln!(out, "- Total: {}", stats.total);
    let _ = writeln!(out, "- Completed: {}", stats.completed);
    let _ = writeln!(out, "- Completion rate: {:.1}%", stats.completion_rate);
    let _ = writeln!(out, "- High priority: {}", stats.high_priority);

    out.push_str("\n## Projects\n");
    for project in &projects {
        let count = tracker.query().project_tasks(project.id).len();
        let _ = writeln!(out, "- {}: {count} tasks", project.name);
    }
    out
}

/// Progress and per-priority counts for one project; `None` when the
/// project does not exist.
#[must_use]
pub fn project_summary(tracker: &Tracker, project_id: i64) -> Option<String> {
    let project = tracker.projects().get(project_id)?;
    let tasks = tracker.query().project_tasks(project_id);
    let completed = tasks
        .iter()
        .filter(|t| t.status == Status::Completed)
        .count();

    let mut out = String::new();
    let _ = writeln!(out, "# {} Summary\n", project.name);
    let description = if project.description.is_empty() {
        "N/A"
    } else {
        project.description.as_str()
    };
    let _ = writeln!(out, "Description: {description}");

    out.push_str("\n## Task Overview\n");
    let _ = writeln!(out, "- Total: {}", tasks.len());
    let _ = writeln!(out, "- Completed: {completed}");
    if tasks.is_empty() {
        out.push_str("- Progress: N/A\n");
    } else {
        let _ = writeln!(out, "- Progress: {}%", completed * 100 / tasks.len());
    }

    out.push_str("\n## Tasks by Priority\n");
    for priority in Priority::ALL {
        let count = tasks.iter().filter(|t| t.priority == priority).count();
        let _ = writeln!(out, "- {}: {count}", priority.as_str().to_uppercase());
    }
    Some(out)
}

/// Overdue tasks grouped by priority, high first.
#[must_use]
pub fn overdue_analysis(tracker: &Tracker, today: NaiveDate) -> String {
    let overdue = tracker.analytics().overdue_as_of(today);

    let mut out = String::from("# Overdue Tasks Analysis\n\n");
    let _ = writeln!(out, "Total overdue: {}", overdue.len());
    out.push_str("\n## Overdue Tasks by Priority\n");

    for priority in Priority::ALL {
        let group: Vec<&Task> = overdue.iter().filter(|t| t.priority == priority).collect();
        let _ = writeln!(
            out,
            "\n### {} Priority ({})",
            priority.as_str().to_uppercase(),
            group.len()
        );
        for task in group {
            let _ = writeln!(out, "- {} (due: {})", task.title, due_label(task));
        }
    }
    out
}
