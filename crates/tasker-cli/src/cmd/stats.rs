//! `tk stats`: aggregate task counts.

use std::io::Write;
use tasker_core::Tracker;
use tasker_core::analytics::TaskStatistics;
use tasker_core::error::ErrorCode;

use crate::output::{OutputMode, fail, pretty_kv, pretty_section, render_mode};

fn write_text(stats: &TaskStatistics, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "total\t{}", stats.total)?;
    writeln!(w, "completed\t{}", stats.completed)?;
    writeln!(w, "pending\t{}", stats.pending)?;
    writeln!(w, "in_progress\t{}", stats.in_progress)?;
    writeln!(w, "blocked\t{}", stats.blocked)?;
    writeln!(w, "high_priority\t{}", stats.high_priority)?;
    writeln!(w, "completion_rate\t{:.1}", stats.completion_rate)
}

fn write_pretty(stats: &TaskStatistics, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Task statistics")?;
    pretty_kv(w, "Total", stats.total.to_string())?;
    pretty_kv(w, "Completed", stats.completed.to_string())?;
    pretty_kv(w, "Pending", stats.pending.to_string())?;
    pretty_kv(
        w,
        "In progress",
        format!("{} ({} blocked)", stats.in_progress, stats.blocked),
    )?;
    pretty_kv(w, "High prio", stats.high_priority.to_string())?;
    pretty_kv(w, "Done", format!("{:.1}%", stats.completion_rate))
}

/// Print counts by status and priority plus the completion rate.
///
/// # Errors
///
/// Returns an error when the counts could not be read.
pub fn run_stats(output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    let Some(stats) = tracker.analytics().statistics() else {
        return fail(output, ErrorCode::OperationFailed, "could not compute statistics");
    };
    render_mode(output, &stats, write_text, write_pretty)
}
