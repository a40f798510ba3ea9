//! `tk search`, `tk filter` and `tk overdue`: the read-side task queries.

use clap::Args;
use tasker_core::Tracker;
use tasker_core::error::ErrorCode;
use tasker_core::query::{FilterError, TaskFilter};

use crate::output::{OutputMode, TaskList, fail, render_mode, write_task_rows, write_task_table};

/// Shortest accepted search query, in characters after trimming.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Full-text query over titles and descriptions (FTS5 syntax).
    pub query: String,
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Only tasks with this status.
    #[arg(short, long)]
    pub status: Option<String>,

    /// Only tasks with this priority.
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Only tasks in this project.
    #[arg(long)]
    pub project: Option<i64>,

    /// Only tasks carrying this tag (case-sensitive).
    #[arg(short, long)]
    pub tag: Option<String>,
}

impl FilterArgs {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        if let Some(priority) = &self.priority {
            pairs.push(("priority", priority.clone()));
        }
        if let Some(project) = self.project {
            pairs.push(("project_id", project.to_string()));
        }
        if let Some(tag) = &self.tag {
            pairs.push(("tag_name", tag.clone()));
        }
        pairs
    }
}

const fn filter_error_code(err: &FilterError) -> ErrorCode {
    match err {
        FilterError::Status(_) | FilterError::Priority(_) | FilterError::ProjectId { .. } => {
            ErrorCode::InvalidEnumValue
        }
        FilterError::BlankTag => ErrorCode::OperationFailed,
    }
}

fn render_tasks(output: OutputMode, list: &TaskList) -> anyhow::Result<()> {
    render_mode(output, list, write_task_rows, write_task_table)
}

/// Relevance-ranked full-text search.
///
/// # Errors
///
/// Returns an error when the trimmed query is shorter than two characters.
pub fn run_search(args: &SearchArgs, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    let query = args.query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return fail(
            output,
            ErrorCode::QueryTooShort,
            format!("Search query too short (minimum {MIN_QUERY_CHARS} characters)"),
        );
    }
    render_tasks(output, &TaskList::new(tracker.query().search(query)))
}

/// Tasks matching every given predicate, in canonical order.
///
/// # Errors
///
/// Returns an error when a status or priority value does not parse.
pub fn run_filter(args: &FilterArgs, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    let filter = match TaskFilter::from_pairs(args.pairs()) {
        Ok(filter) => filter,
        Err(err) => return fail(output, filter_error_code(&err), err.to_string()),
    };
    render_tasks(output, &TaskList::new(tracker.query().filter(&filter)))
}

/// Incomplete tasks due before today.
///
/// # Errors
///
/// Returns an error if writing the output fails.
pub fn run_overdue(output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    render_tasks(output, &TaskList::new(tracker.analytics().overdue()))
}
