//! `tk task`: task CRUD and the paginated canonical listing.

use clap::{Args, Subcommand};
use serde_json::json;
use std::io::Write;
use tasker_core::Tracker;
use tasker_core::error::ErrorCode;
use tasker_core::model::{NewTask, Task, TaskUpdate};
use tracing::{debug, warn};

use super::{parse_due, parse_opt, parse_priority, parse_status};
use crate::output::{
    OutputMode, TaskList, fail, render, render_mode, write_task_detail, write_task_row,
    write_task_rows, write_task_table,
};

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Create a task.
    Create(TaskCreateArgs),
    /// Show one task with its tags.
    Show(TaskIdArgs),
    /// List tasks in canonical order (high priority first, then by due date).
    List(TaskListArgs),
    /// Change fields of a task.
    Update(TaskUpdateArgs),
    /// Delete a task and its tag links.
    Delete(TaskIdArgs),
}

#[derive(Args, Debug)]
pub struct TaskCreateArgs {
    /// Task title.
    pub title: String,

    /// Free-form description.
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Priority: low, medium or high.
    #[arg(short, long, default_value = "medium")]
    pub priority: String,

    /// Status: pending, `in_progress`, completed or blocked.
    #[arg(short, long, default_value = "pending")]
    pub status: String,

    /// Owning project ID.
    #[arg(long)]
    pub project: Option<i64>,

    /// Due date (YYYY-MM-DD).
    #[arg(long)]
    pub due: Option<String>,

    /// Tags to attach after creation (repeatable).
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct TaskIdArgs {
    /// Task ID.
    pub id: i64,
}

#[derive(Args, Debug)]
pub struct TaskListArgs {
    /// Maximum number of tasks (defaults to the configured query limit).
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,

    /// Number of tasks to skip.
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

#[derive(Args, Debug)]
pub struct TaskUpdateArgs {
    /// Task ID.
    pub id: i64,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// New status.
    #[arg(short, long)]
    pub status: Option<String>,

    /// New priority.
    #[arg(short, long)]
    pub priority: Option<String>,

    /// New due date (YYYY-MM-DD).
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,

    /// Remove the due date.
    #[arg(long)]
    pub clear_due: bool,
}

/// Dispatch a `tk task` subcommand.
///
/// # Errors
///
/// Returns an error for unknown tasks or projects, invalid field values,
/// and rejected writes.
pub fn run_task(command: &TaskCommand, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    match command {
        TaskCommand::Create(args) => run_create(args, output, tracker),
        TaskCommand::Show(args) => run_show(args.id, output, tracker),
        TaskCommand::List(args) => run_list(args, output, tracker),
        TaskCommand::Update(args) => run_update(args, output, tracker),
        TaskCommand::Delete(args) => run_delete(args.id, output, tracker),
    }
}

pub fn task_not_found<T>(output: OutputMode, id: i64) -> anyhow::Result<T> {
    fail(output, ErrorCode::TaskNotFound, format!("task {id} not found"))
}

fn render_task(output: OutputMode, task: &Task) -> anyhow::Result<()> {
    render_mode(output, task, write_task_row, write_task_detail)
}

fn run_create(args: &TaskCreateArgs, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    if args.title.trim().is_empty() {
        return fail(output, ErrorCode::OperationFailed, "task title must not be blank");
    }

    let mut new = NewTask::new(args.title.clone())
        .description(args.description.clone())
        .priority(parse_priority(output, &args.priority)?)
        .status(parse_status(output, &args.status)?);
    if let Some(due) = parse_opt(output, args.due.as_deref(), parse_due)? {
        new = new.due(due);
    }
    if let Some(project_id) = args.project {
        if tracker.projects().get(project_id).is_none() {
            return fail(
                output,
                ErrorCode::UnknownProject,
                format!("project {project_id} does not exist"),
            );
        }
        new = new.project(project_id);
    }

    let Some(task) = tracker.tasks().create(&new) else {
        return fail(
            output,
            ErrorCode::OperationFailed,
            format!("could not create task '{}'", args.title),
        );
    };

    for tag in &args.tags {
        if !tracker.tags().add_tag(task.id, tag) {
            warn!(task_id = task.id, tag = %tag, "skipped tag on new task");
        }
    }
    let task = if args.tags.is_empty() {
        task
    } else {
        tracker.tasks().get(task.id).unwrap_or(task)
    };
    debug!(task_id = task.id, "task created via cli");

    render_mode(
        output,
        &task,
        |t, w| writeln!(w, "{}", t.id),
        |t, w| writeln!(w, "Created task #{}: {}", t.id, t.title),
    )
}

fn run_show(id: i64, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    match tracker.tasks().get(id) {
        Some(task) => render_task(output, &task),
        None => task_not_found(output, id),
    }
}

fn run_list(args: &TaskListArgs, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    let list = TaskList::new(tracker.query().list(args.limit, args.offset));
    render_mode(output, &list, write_task_rows, write_task_table)
}

fn run_update(args: &TaskUpdateArgs, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    if tracker.tasks().get(args.id).is_none() {
        return task_not_found(output, args.id);
    }
    if args.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return fail(output, ErrorCode::OperationFailed, "task title must not be blank");
    }

    let due_date = if args.clear_due {
        Some(None)
    } else {
        parse_opt(output, args.due.as_deref(), parse_due)?.map(Some)
    };
    let update = TaskUpdate {
        title: args.title.clone(),
        description: args.description.clone(),
        status: parse_opt(output, args.status.as_deref(), parse_status)?,
        priority: parse_opt(output, args.priority.as_deref(), parse_priority)?,
        due_date,
    };

    match tracker.tasks().update(args.id, &update) {
        Some(task) => render_task(output, &task),
        None => fail(
            output,
            ErrorCode::OperationFailed,
            format!("could not update task {}", args.id),
        ),
    }
}

fn run_delete(id: i64, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    if !tracker.tasks().delete(id) {
        return task_not_found(output, id);
    }
    render(output, &json!({ "id": id, "deleted": true }), |_, w| {
        writeln!(w, "Deleted task #{id}")
    })
}
