//! Shared output layer for pretty/text/JSON parity across all commands.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use tasker_core::error::ErrorCode;
use tasker_core::model::{Project, Task};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, aligned fields).
    Pretty,
    /// Token-efficient plain text for scripts and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    if let Some(val) = format_env {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {}
        }
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, and TTY defaults.
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(format_flag, json_flag, env_val.as_deref(), is_tty)
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Fixed summary of the error code, e.g. "Task not found".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (`E####`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Build an error carrying `code`, its summary and its hint.
    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            summary: Some(code.message().to_owned()),
            suggestion: code.hint().map(str::to_owned),
            error_code: Some(code.code().to_owned()),
        }
    }
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render a serializable value; pretty and text share `human_fn`.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            human_fn(value, &mut out)?;
        }
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(mode, error, &mut out)
}

fn write_error(mode: OutputMode, error: &CliError, w: &mut dyn Write) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *w, &wrapper)?;
            writeln!(w)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match (&error.error_code, &error.summary) {
                (Some(code), Some(summary)) => {
                    writeln!(w, "error[{code}] {summary}: {}", error.message)?;
                }
                (Some(code), None) => writeln!(w, "error[{code}]: {}", error.message)?,
                (None, _) => writeln!(w, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(w, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render a structured error and return it as a failed command result.
pub fn fail<T>(mode: OutputMode, code: ErrorCode, message: impl Into<String>) -> anyhow::Result<T> {
    let error = CliError::from_code(code, message);
    render_error(mode, &error)?;
    anyhow::bail!("{}: {}", code.code(), error.message)
}

/// JSON envelope for task lists: `{"count": n, "tasks": [...]}`.
#[derive(Debug, Serialize)]
pub struct TaskList {
    pub count: usize,
    pub tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            count: tasks.len(),
            tasks,
        }
    }
}

/// JSON envelope for project lists: `{"count": n, "projects": [...]}`.
#[derive(Debug, Serialize)]
pub struct ProjectList {
    pub count: usize,
    pub projects: Vec<Project>,
}

impl ProjectList {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            count: projects.len(),
            projects,
        }
    }
}

fn due_text(task: &Task) -> String {
    task.due_date
        .map_or_else(|| "-".to_string(), tasker_core::model::date::format)
}

fn tags_text(task: &Task) -> String {
    if task.tags.is_empty() {
        "-".to_string()
    } else {
        task.tag_names().join(",")
    }
}

/// One tab-separated line per task: id, priority, status, due, tags, title.
pub fn write_task_row(task: &Task, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}",
        task.id,
        task.priority,
        task.status,
        due_text(task),
        tags_text(task),
        task.title
    )
}

pub fn write_task_rows(list: &TaskList, w: &mut dyn Write) -> io::Result<()> {
    for task in &list.tasks {
        write_task_row(task, w)?;
    }
    Ok(())
}

/// Aligned table of tasks with a count heading.
pub fn write_task_table(list: &TaskList, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Tasks ({})", list.count))?;
    if list.tasks.is_empty() {
        return writeln!(w, "(none)");
    }
    writeln!(
        w,
        "{:>5}  {:<6}  {:<11}  {:<10}  TITLE",
        "ID", "PRIO", "STATUS", "DUE"
    )?;
    for task in &list.tasks {
        write!(
            w,
            "{:>5}  {:<6}  {:<11}  {:<10}  {}",
            task.id,
            task.priority.as_str(),
            task.status.as_str(),
            due_text(task),
            task.title
        )?;
        if task.tags.is_empty() {
            writeln!(w)?;
        } else {
            writeln!(w, "  [{}]", task.tag_names().join(", "))?;
        }
    }
    Ok(())
}

/// Full detail view of one task.
pub fn write_task_detail(task: &Task, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Task #{}: {}", task.id, task.title))?;
    pretty_kv(w, "Priority", task.priority.as_str())?;
    pretty_kv(w, "Status", task.status.as_str())?;
    pretty_kv(
        w,
        "Project",
        task.project_id
            .map_or_else(|| "-".to_string(), |id| id.to_string()),
    )?;
    pretty_kv(w, "Due", due_text(task))?;
    pretty_kv(w, "Tags", tags_text(task))?;
    pretty_kv(
        w,
        "Created",
        tasker_core::model::timestamp::format(&task.created_at),
    )?;
    pretty_kv(
        w,
        "Updated",
        tasker_core::model::timestamp::format(&task.updated_at),
    )?;
    if !task.description.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", task.description)?;
    }
    Ok(())
}

pub fn write_project_row(project: &Project, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}\t{}\t{}", project.id, project.name, project.description)
}

pub fn write_project_rows(list: &ProjectList, w: &mut dyn Write) -> io::Result<()> {
    for project in &list.projects {
        write_project_row(project, w)?;
    }
    Ok(())
}

/// Projects by id and name with a count heading.
pub fn write_project_table(list: &ProjectList, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Projects ({})", list.count))?;
    if list.projects.is_empty() {
        return writeln!(w, "(none)");
    }
    for project in &list.projects {
        if project.description.is_empty() {
            writeln!(w, "{:>5}  {}", project.id, project.name)?;
        } else {
            writeln!(
                w,
                "{:>5}  {}  ({})",
                project.id, project.name, project.description
            )?;
        }
    }
    Ok(())
}

pub fn write_project_detail(project: &Project, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Project #{}: {}", project.id, project.name))?;
    if !project.description.is_empty() {
        pretty_kv(w, "Description", &project.description)?;
    }
    pretty_kv(
        w,
        "Created",
        tasker_core::model::timestamp::format(&project.created_at),
    )?;
    pretty_kv(
        w,
        "Updated",
        tasker_core::model::timestamp::format(&project.updated_at),
    )
}
