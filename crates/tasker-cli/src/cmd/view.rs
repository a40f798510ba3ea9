//! `tk view <uri>`: fixed read-only resource views.

use clap::Args;
use std::fmt;
use std::str::FromStr;
use tasker_core::Tracker;
use tasker_core::model::{Priority, Status};
use tasker_core::query::TaskFilter;

use crate::output::{
    OutputMode, ProjectList, TaskList, render_mode, write_project_rows, write_project_table,
    write_task_rows, write_task_table,
};

/// Row cap for `task://all`.
const ALL_TASKS_LIMIT: u32 = 1_000;

/// A named resource view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    AllTasks,
    PendingTasks,
    HighPriorityTasks,
    AllProjects,
    StatsSummary,
}

impl Resource {
    pub const ALL: [Self; 5] = [
        Self::AllTasks,
        Self::PendingTasks,
        Self::HighPriorityTasks,
        Self::AllProjects,
        Self::StatsSummary,
    ];

    pub const fn uri(self) -> &'static str {
        match self {
            Self::AllTasks => "task://all",
            Self::PendingTasks => "task://pending",
            Self::HighPriorityTasks => "task://high-priority",
            Self::AllProjects => "project://all",
            Self::StatsSummary => "stats://summary",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.uri() == s.trim())
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|r| r.uri()).collect();
                format!("unknown resource '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Resource URI, e.g. `task://pending` or `stats://summary`.
    pub uri: Resource,
}

/// Render one resource view.
///
/// # Errors
///
/// Returns an error if statistics cannot be read or writing fails.
pub fn run_view(args: &ViewArgs, output: OutputMode, tracker: &Tracker) -> anyhow::Result<()> {
    let tasks = match args.uri {
        Resource::AllTasks => tracker.query().list(Some(ALL_TASKS_LIMIT), 0),
        Resource::PendingTasks => tracker
            .query()
            .filter(&TaskFilter::new().status(Status::Pending)),
        Resource::HighPriorityTasks => tracker
            .query()
            .filter(&TaskFilter::new().priority(Priority::High)),
        Resource::AllProjects => {
            let list = ProjectList::new(tracker.projects().list());
            return render_mode(output, &list, write_project_rows, write_project_table);
        }
        Resource::StatsSummary => return super::stats::run_stats(output, tracker),
    };
    render_mode(output, &TaskList::new(tasks), write_task_rows, write_task_table)
}
