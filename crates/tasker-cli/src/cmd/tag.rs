//! `tk tag add|rm` and `tk tags`.

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use tasker_core::Tracker;
use tasker_core::error::ErrorCode;
use tasker_core::model::Tag;

use super::task::task_not_found;
use crate::output::{OutputMode, fail, pretty_section, render, render_mode};

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Attach a tag to a task, creating the tag if needed.
    Add(TagLinkArgs),
    /// Detach a tag from a task.
    Rm(TagLinkArgs),
}

#[derive(Args, Debug)]
pub struct TagLinkArgs {
    /// Task ID.
    pub task_id: i64,

    /// Tag name (case-sensitive).
    pub name: String,
}

#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Only list tags attached to this task.
    #[arg(long)]
    pub task: Option<i64>,
}

#[derive(Debug, Serialize)]
struct TagList {
    count: usize,
    tags: Vec<Tag>,
}

/// Dispatch `tk tag add` / `tk tag rm`.
///
/// # Errors
///
/// Returns an error for a missing task, a blank name, or an unknown tag.
pub fn run_tag(command: &TagCommand, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    match command {
        TagCommand::Add(args) => {
            if args.name.trim().is_empty() {
                return fail(output, ErrorCode::OperationFailed, "tag name must not be blank");
            }
            if tracker.tasks().get(args.task_id).is_none() {
                return task_not_found(output, args.task_id);
            }
            if !tracker.tags().add_tag(args.task_id, &args.name) {
                return fail(
                    output,
                    ErrorCode::OperationFailed,
                    format!("could not tag task {} with '{}'", args.task_id, args.name),
                );
            }
            render_link(output, args, "added")
        }
        TagCommand::Rm(args) => {
            if !tracker.tags().remove_tag(args.task_id, &args.name) {
                return fail(
                    output,
                    ErrorCode::TagNotFound,
                    format!("tag '{}' not found", args.name),
                );
            }
            render_link(output, args, "removed")
        }
    }
}

fn render_link(output: OutputMode, args: &TagLinkArgs, action: &str) -> anyhow::Result<()> {
    let value = json!({ "task_id": args.task_id, "tag": args.name, action: true });
    render(output, &value, |_, w| {
        writeln!(w, "Tag '{}' {action} on task #{}", args.name, args.task_id)
    })
}

/// List all tags, or the tags of one task.
///
/// # Errors
///
/// Returns an error if `--task` names a missing task or writing fails.
pub fn run_tags(args: &TagsArgs, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    let tags = match args.task {
        Some(task_id) => {
            if tracker.tasks().get(task_id).is_none() {
                return task_not_found(output, task_id);
            }
            tracker.tags().tags_for_task(task_id)
        }
        None => tracker.tags().list_tags(),
    };
    let list = TagList {
        count: tags.len(),
        tags,
    };
    render_mode(
        output,
        &list,
        |list, w| {
            for tag in &list.tags {
                writeln!(w, "{}", tag.name)?;
            }
            Ok(())
        },
        |list, w| {
            pretty_section(w, &format!("Tags ({})", list.count))?;
            if list.tags.is_empty() {
                return writeln!(w, "(none)");
            }
            for tag in &list.tags {
                writeln!(w, "{:>5}  {}", tag.id, tag.name)?;
            }
            Ok(())
        },
    )
}
