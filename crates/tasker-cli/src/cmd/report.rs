//! `tk report`: markdown reviews built from read-only queries.

use chrono::Local;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write;
use tasker_core::Tracker;
use tasker_core::error::ErrorCode;
use tasker_core::report;

use crate::output::{OutputMode, fail, render};

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Summary counts, overdue tasks and today's pending tasks.
    Daily,
    /// Project overview and task metrics for the week ahead.
    Weekly,
    /// Progress and priority breakdown for one project.
    Project(ReportProjectArgs),
    /// Overdue tasks grouped by priority.
    Overdue,
}

#[derive(Args, Debug)]
pub struct ReportProjectArgs {
    /// Project ID.
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct Report {
    kind: &'static str,
    markdown: String,
}

/// Build and print a report.
///
/// # Errors
///
/// Returns an error when the project for a project report does not exist.
pub fn run_report(
    command: &ReportCommand,
    output: OutputMode,
    tracker: &Tracker,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let report = match command {
        ReportCommand::Daily => Report {
            kind: "daily",
            markdown: report::daily_review(tracker, today),
        },
        ReportCommand::Weekly => Report {
            kind: "weekly",
            markdown: report::weekly_planning(tracker),
        },
        ReportCommand::Project(args) => {
            let Some(markdown) = report::project_summary(tracker, args.id) else {
                return fail(
                    output,
                    ErrorCode::ProjectNotFound,
                    format!("project {} not found", args.id),
                );
            };
            Report {
                kind: "project",
                markdown,
            }
        }
        ReportCommand::Overdue => Report {
            kind: "overdue",
            markdown: report::overdue_analysis(tracker, today),
        },
    };

    render(output, &report, |r, w| write!(w, "{}", r.markdown))
}
