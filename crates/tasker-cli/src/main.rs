#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use tasker_core::Tracker;
use tasker_core::config::resolve_config;
use tasker_core::error::ErrorCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tasker: SQLite-backed task and project tracker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Database file (overrides TASKER_DB and config files).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (takes precedence over --json and FORMAT).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        subcommand,
        next_help_heading = "Records",
        about = "Manage projects",
        long_about = "Create, show, list, update and delete projects, or list a project's tasks.",
        after_help = "EXAMPLES:\n    # Create a project\n    tk project create Launch -d \"Q3 release\"\n\n    # List a project's tasks\n    tk project tasks 1\n\n    # Emit machine-readable output\n    tk project list --json"
    )]
    Project(cmd::project::ProjectCommand),

    #[command(
        subcommand,
        next_help_heading = "Records",
        about = "Manage tasks",
        long_about = "Create, show, list, update and delete tasks.",
        after_help = "EXAMPLES:\n    # Create a high-priority task due Friday\n    tk task create \"Ship\" -p high --due 2024-06-14 --project 1\n\n    # Mark it done\n    tk task update 3 -s completed\n\n    # Page through tasks\n    tk task list -n 20 --offset 40"
    )]
    Task(cmd::task::TaskCommand),

    #[command(
        subcommand,
        next_help_heading = "Records",
        about = "Attach or detach task tags",
        long_about = "Attach a tag to a task (creating the tag if needed) or detach it.",
        after_help = "EXAMPLES:\n    # Tag a task\n    tk tag add 3 backend\n\n    # Untag it\n    tk tag rm 3 backend"
    )]
    Tag(cmd::tag::TagCommand),

    #[command(
        next_help_heading = "Records",
        about = "List tags",
        long_about = "List all tags by name, or only the tags attached to one task.",
        after_help = "EXAMPLES:\n    # All tags\n    tk tags\n\n    # Tags on task 3\n    tk tags --task 3"
    )]
    Tags(cmd::tag::TagsArgs),

    #[command(
        next_help_heading = "Read",
        about = "Full-text search",
        long_about = "Search task titles and descriptions, best match first.",
        after_help = "EXAMPLES:\n    # Simple search\n    tk search deploy\n\n    # Prefix and phrase syntax\n    tk search 'deplo* AND \"release notes\"'"
    )]
    Search(cmd::search::SearchArgs),

    #[command(
        next_help_heading = "Read",
        about = "Filter tasks",
        long_about = "List tasks matching every given predicate, high priority first.",
        after_help = "EXAMPLES:\n    # Pending high-priority tasks\n    tk filter -s pending -p high\n\n    # Tasks tagged backend in project 1\n    tk filter --project 1 -t backend"
    )]
    Filter(cmd::search::FilterArgs),

    #[command(
        next_help_heading = "Read",
        about = "List overdue tasks",
        long_about = "List incomplete tasks whose due date is before today.",
        after_help = "EXAMPLES:\n    tk overdue\n    tk overdue --json"
    )]
    Overdue,

    #[command(
        next_help_heading = "Read",
        about = "Show task statistics",
        long_about = "Show counts by status and priority plus the completion rate.",
        after_help = "EXAMPLES:\n    tk stats\n    tk stats --json"
    )]
    Stats,

    #[command(
        subcommand,
        next_help_heading = "Read",
        about = "Markdown reports",
        long_about = "Print a daily review, weekly plan, project summary or overdue analysis.",
        after_help = "EXAMPLES:\n    # Start the day\n    tk report daily\n\n    # Summarize project 1\n    tk report project 1"
    )]
    Report(cmd::report::ReportCommand),

    #[command(
        next_help_heading = "Read",
        about = "Show a resource view",
        long_about = "Show one of the fixed views: task://all, task://pending, task://high-priority, project://all, stats://summary.",
        after_help = "EXAMPLES:\n    tk view task://pending\n    tk view stats://summary --json"
    )]
    View(cmd::view::ViewArgs),

    #[command(
        next_help_heading = "Shell",
        about = "Generate shell completions",
        long_about = "Print a completion script for the given shell to stdout.",
        after_help = "EXAMPLES:\n    tk completions bash > ~/.local/share/bash-completion/completions/tk\n    tk completions zsh > ~/.zfunc/_tk"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TASKER_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "tasker=debug,info"
        } else {
            "tasker=info,warn"
        })
    });

    let format = env::var("TASKER_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Resolve configuration and open the tracker, rendering a coded error on
/// failure.
fn open_tracker(db_flag: Option<PathBuf>, output: OutputMode) -> anyhow::Result<Tracker> {
    let project_root = env::current_dir()?;
    let config = match resolve_config(&project_root, db_flag) {
        Ok(config) => config,
        Err(err) => {
            render_error(
                output,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{err:#}")),
            )?;
            return Err(err);
        }
    };

    match Tracker::open(&config) {
        Ok(tracker) => Ok(tracker),
        Err(err) => {
            render_error(output, &CliError::from_code(err.code(), err.to_string()))?;
            Err(err.into())
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let output = cli.output_mode();

    if cli.verbose {
        info!(json = output.is_json(), "Verbose mode enabled");
    }

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let tracker = open_tracker(cli.db.clone(), output)?;

    let result = match &cli.command {
        Commands::Project(command) => cmd::project::run_project(command, output, &tracker),
        Commands::Task(command) => cmd::task::run_task(command, output, &tracker),
        Commands::Tag(command) => cmd::tag::run_tag(command, output, &tracker),
        Commands::Tags(args) => cmd::tag::run_tags(args, output, &tracker),
        Commands::Search(args) => cmd::search::run_search(args, output, &tracker),
        Commands::Filter(args) => cmd::search::run_filter(args, output, &tracker),
        Commands::Overdue => cmd::search::run_overdue(output, &tracker),
        Commands::Stats => cmd::stats::run_stats(output, &tracker),
        Commands::Report(command) => cmd::report::run_report(command, output, &tracker),
        Commands::View(args) => cmd::view::run_view(args, output, &tracker),
        Commands::Completions(_) => Ok(()),
    };

    let closed = tracker.close();
    result?;
    closed?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["tk", "--json", "stats"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["tk", "task", "list", "--json", "--db", "/tmp/x.db"]);
        assert!(cli.json);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn format_flag_beats_json_flag() {
        let cli = Cli::parse_from(["tk", "--json", "--format", "text", "stats"]);
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn task_create_parses_repeated_tags() {
        let cli = Cli::parse_from([
            "tk", "task", "create", "Ship", "-p", "high", "--due", "2024-06-14", "-t", "a", "-t",
            "b",
        ]);
        let Commands::Task(cmd::task::TaskCommand::Create(args)) = cli.command else {
            panic!("expected task create");
        };
        assert_eq!(args.title, "Ship");
        assert_eq!(args.priority, "high");
        assert_eq!(args.status, "pending");
        assert_eq!(args.tags, vec!["a", "b"]);
    }

    #[test]
    fn task_update_rejects_due_with_clear_due() {
        let result = Cli::try_parse_from([
            "tk",
            "task",
            "update",
            "1",
            "--due",
            "2024-06-14",
            "--clear-due",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn view_rejects_unknown_uri() {
        assert!(Cli::try_parse_from(["tk", "view", "task://nope"]).is_err());
        let cli = Cli::parse_from(["tk", "view", "stats://summary"]);
        assert!(matches!(
            cli.command,
            Commands::View(cmd::view::ViewArgs {
                uri: cmd::view::Resource::StatsSummary
            })
        ));
    }

    #[test]
    fn report_project_takes_id() {
        let cli = Cli::parse_from(["tk", "report", "project", "7"]);
        assert!(matches!(
            cli.command,
            Commands::Report(cmd::report::ReportCommand::Project(cmd::report::ReportProjectArgs {
                id: 7
            }))
        ));
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["tk", "completions", "bash"]);
        assert!(matches!(cli.command, Commands::Completions(_)));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
