//! `tk project`: create, inspect, rename and delete projects.

use clap::{Args, Subcommand};
use serde_json::json;
use std::io::Write;
use tasker_core::Tracker;
use tasker_core::error::ErrorCode;
use tasker_core::model::ProjectUpdate;
use tracing::debug;

use crate::output::{
    OutputMode, ProjectList, TaskList, fail, render, render_mode, write_project_detail,
    write_project_row, write_project_rows, write_project_table, write_task_rows,
    write_task_table,
};

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project.
    Create(ProjectCreateArgs),
    /// Show one project.
    Show(ProjectIdArgs),
    /// List all projects by name.
    List,
    /// Rename a project or change its description.
    Update(ProjectUpdateArgs),
    /// Delete a project. Its tasks keep their project reference.
    Delete(ProjectIdArgs),
    /// List the tasks of a project.
    Tasks(ProjectIdArgs),
}

#[derive(Args, Debug)]
pub struct ProjectCreateArgs {
    /// Project name.
    pub name: String,

    /// Free-form description.
    #[arg(short, long, default_value = "")]
    pub description: String,
}

#[derive(Args, Debug)]
pub struct ProjectIdArgs {
    /// Project ID.
    pub id: i64,
}

#[derive(Args, Debug)]
pub struct ProjectUpdateArgs {
    /// Project ID.
    pub id: i64,

    /// New name.
    #[arg(long)]
    pub name: Option<String>,

    /// New description.
    #[arg(short, long)]
    pub description: Option<String>,
}

/// Dispatch a `tk project` subcommand.
///
/// # Errors
///
/// Returns an error when the project does not exist or the store rejects
/// the write.
pub fn run_project(
    command: &ProjectCommand,
    output: OutputMode,
    tracker: &Tracker,
) -> anyhow::Result<()> {
    match command {
        ProjectCommand::Create(args) => run_create(args, output, tracker),
        ProjectCommand::Show(args) => run_show(args.id, output, tracker),
        ProjectCommand::List => run_list(output, tracker),
        ProjectCommand::Update(args) => run_update(args, output, tracker),
        ProjectCommand::Delete(args) => run_delete(args.id, output, tracker),
        ProjectCommand::Tasks(args) => run_tasks(args.id, output, tracker),
    }
}

fn not_found<T>(output: OutputMode, id: i64) -> anyhow::Result<T> {
    fail(
        output,
        ErrorCode::ProjectNotFound,
        format!("project {id} not found"),
    )
}

fn run_create(args: &ProjectCreateArgs, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    if args.name.trim().is_empty() {
        return fail(
            output,
            ErrorCode::OperationFailed,
            "project name must not be blank",
        );
    }
    let Some(project) = tracker.projects().create(&args.name, &args.description) else {
        return fail(
            output,
            ErrorCode::OperationFailed,
            format!("could not create project '{}'", args.name),
        );
    };
    debug!(project_id = project.id, "project created via cli");

    render_mode(
        output,
        &project,
        |p, w| writeln!(w, "{}", p.id),
        |p, w| {
            writeln!(w, "Created project #{}: {}", p.id, p.name)
        },
    )
}

fn run_show(id: i64, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    let Some(project) = tracker.projects().get(id) else {
        return not_found(output, id);
    };
    render_mode(output, &project, write_project_row, write_project_detail)
}

fn run_list(output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    let list = ProjectList::new(tracker.projects().list());
    render_mode(output, &list, write_project_rows, write_project_table)
}

fn run_update(args: &ProjectUpdateArgs, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    if tracker.projects().get(args.id).is_none() {
        return not_found(output, args.id);
    }
    if args.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return fail(
            output,
            ErrorCode::OperationFailed,
            "project name must not be blank",
        );
    }
    let update = ProjectUpdate {
        name: args.name.clone(),
        description: args.description.clone(),
    };
    let Some(project) = tracker.projects().update(args.id, &update) else {
        return fail(
            output,
            ErrorCode::OperationFailed,
            format!("could not update project {}", args.id),
        );
    };
    render_mode(output, &project, write_project_row, write_project_detail)
}

fn run_delete(id: i64, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    if !tracker.projects().delete(id) {
        return not_found(output, id);
    }
    render(output, &json!({ "id": id, "deleted": true }), |_, w| {
        writeln!(w, "Deleted project #{id}")
    })
}

fn run_tasks(id: i64, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    let list = TaskList::new(tracker.query().project_tasks(id));
    render_mode(output, &list, write_task_rows, write_task_table)
}
