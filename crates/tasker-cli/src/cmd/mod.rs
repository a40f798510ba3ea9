//! Subcommand implementations.
//!
//! Each `run_*` takes its parsed arguments, the resolved output mode and the
//! opened [`Tracker`](tasker_core::Tracker). User-facing failures are rendered
//! through [`crate::output::fail`] so they carry a stable error code.

pub mod completions;
pub mod project;
pub mod report;
pub mod search;
pub mod stats;
pub mod tag;
pub mod task;
pub mod view;

use chrono::NaiveDate;
use tasker_core::error::ErrorCode;
use tasker_core::model::{Priority, Status, date};

use crate::output::{OutputMode, fail};

pub fn parse_priority(output: OutputMode, raw: &str) -> anyhow::Result<Priority> {
    match raw.parse() {
        Ok(priority) => Ok(priority),
        Err(err) => fail(output, ErrorCode::InvalidEnumValue, format!("{err}")),
    }
}

pub fn parse_status(output: OutputMode, raw: &str) -> anyhow::Result<Status> {
    match raw.parse() {
        Ok(status) => Ok(status),
        Err(err) => fail(output, ErrorCode::InvalidEnumValue, format!("{err}")),
    }
}

pub fn parse_due(output: OutputMode, raw: &str) -> anyhow::Result<NaiveDate> {
    match date::parse(raw) {
        Ok(due) => Ok(due),
        Err(err) => fail(
            output,
            ErrorCode::InvalidDate,
            format!("invalid due date '{raw}': {err}"),
        ),
    }
}

pub fn parse_opt<T>(
    output: OutputMode,
    raw: Option<&str>,
    parse: fn(OutputMode, &str) -> anyhow::Result<T>,
) -> anyhow::Result<Option<T>> {
    raw.map(|value| parse(output, value)).transpose()
}
