//! E2E CLI tests covering search, filters, overdue detection, statistics,
//! reports and resource views.

use assert_cmd::Command;
use chrono::{Days, Local};
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn tk_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tk"));
    cmd.current_dir(dir);
    cmd.env("TASKER_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd.env_remove("TASKER_DB");
    cmd.env_remove("FORMAT");
    cmd.arg("--db").arg(dir.join("tasks.db"));
    cmd
}

fn tk_json(dir: &Path, args: &[&str]) -> Value {
    let output = tk_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("tk should not crash");
    assert!(
        output.status.success(),
        "tk {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

fn create_task(dir: &Path, title: &str, extra: &[&str]) -> i64 {
    let mut args = vec!["task", "create", title];
    args.extend_from_slice(extra);
    tk_json(dir, &args)["id"].as_i64().expect("task id")
}

fn titles(list: &Value) -> Vec<String> {
    list["tasks"]
        .as_array()
        .expect("tasks array")
        .iter()
        .map(|t| t["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

/// First JSON document written to stderr by a failing command.
fn error_json(output: &std::process::Output) -> Value {
    serde_json::Deserializer::from_slice(&output.stderr)
        .into_iter::<Value>()
        .next()
        .expect("stderr should start with a JSON error")
        .expect("valid JSON error")
}

fn yesterday() -> String {
    Local::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .expect("yesterday")
        .format("%Y-%m-%d")
        .to_string()
}

// ===========================================================================
// Search
// ===========================================================================

#[test]
fn search_ranks_title_hits_and_carries_tags() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path();
    create_task(path, "Quarterly report", &["-d", "numbers"]);
    let id = create_task(path, "Deploy service", &["-d", "write the deploy report"]);
    tk_json(path, &["tag", "add", &id.to_string(), "ops"]);
    create_task(path, "Unrelated", &[]);

    let hits = tk_json(path, &["search", "report"]);
    assert_eq!(hits["count"], 2);
    assert_eq!(titles(&hits), vec!["Quarterly report", "Deploy service"]);
    assert_eq!(hits["tasks"][1]["tags"][0]["name"], "ops");

    let stemmed = tk_json(path, &["search", "deploying"]);
    assert_eq!(titles(&stemmed), vec!["Deploy service"]);
}

#[test]
fn search_rejects_short_queries() {
    let dir = TempDir::new().expect("tempdir");
    let output = tk_cmd(dir.path())
        .args(["search", " a ", "--json"])
        .output()
        .expect("tk should not crash");
    assert!(!output.status.success());
    let err = error_json(&output);
    assert_eq!(err["error"]["error_code"], "E2007");
    assert!(
        err["error"]["message"]
            .as_str()
            .unwrap_or_default()
            .contains("minimum 2 characters")
    );
}

#[test]
fn malformed_search_syntax_returns_empty() {
    let dir = TempDir::new().expect("tempdir");
    create_task(dir.path(), "Anything", &[]);
    let hits = tk_json(dir.path(), &["search", "anything AND"]);
    assert_eq!(hits["count"], 0);
}

// ===========================================================================
// Filter
// ===========================================================================

#[test]
fn filter_intersects_predicates() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path();
    let a = create_task(path, "a", &["-p", "high", "-t", "work"]);
    create_task(path, "b", &["-p", "high"]);
    create_task(path, "c", &["-t", "work"]);
    create_task(path, "d", &["-p", "high", "-t", "work", "-s", "completed"]);

    let both = tk_json(path, &["filter", "-p", "high", "-t", "work", "-s", "pending"]);
    assert_eq!(both["count"], 1);
    assert_eq!(both["tasks"][0]["id"].as_i64(), Some(a));

    let high = tk_json(path, &["filter", "-p", "high"]);
    assert_eq!(titles(&high), vec!["a", "b", "d"]);

    let everything = tk_json(path, &["filter"]);
    assert_eq!(everything["count"], 4);
}

#[test]
fn filter_rejects_bad_enum_values() {
    let dir = TempDir::new().expect("tempdir");
    tk_cmd(dir.path())
        .args(["filter", "-s", "done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2005"));
}

// ===========================================================================
// Overdue and statistics
// ===========================================================================

#[test]
fn overdue_and_stats_reflect_completion() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path();
    let due = yesterday();
    let late = create_task(path, "Late", &["-p", "high", "--due", &due]);
    create_task(path, "Future", &["--due", "2999-01-01"]);
    create_task(path, "Stuck", &["-s", "blocked"]);

    let overdue = tk_json(path, &["overdue"]);
    assert_eq!(titles(&overdue), vec!["Late"]);

    let stats = tk_json(path, &["stats"]);
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["pending"], 2);
    assert_eq!(stats["completed"], 0);
    assert_eq!(stats["in_progress"], 1);
    assert_eq!(stats["blocked"], 1);
    assert_eq!(stats["high_priority"], 1);

    tk_json(path, &["task", "update", &late.to_string(), "-s", "completed"]);
    assert_eq!(tk_json(path, &["overdue"])["count"], 0);

    let stats = tk_json(path, &["stats"]);
    let rate = stats["completion_rate"].as_f64().expect("rate");
    assert!((rate - 100.0 / 3.0).abs() < 1e-9);
}

#[test]
fn stats_on_empty_store_are_zero() {
    let dir = TempDir::new().expect("tempdir");
    let stats = tk_json(dir.path(), &["stats"]);
    assert_eq!(stats["total"], 0);
    assert_eq!(stats["completion_rate"].as_f64(), Some(0.0));
}

// ===========================================================================
// Reports and views
// ===========================================================================

#[test]
fn daily_report_lists_overdue_task() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path();
    create_task(path, "Ship", &["-p", "high", "--due", &yesterday()]);

    tk_cmd(path)
        .args(["report", "daily", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Daily Task Review"))
        .stdout(predicate::str::contains("- [high] Ship (due: "));
}

#[test]
fn project_report_requires_existing_project() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path();
    let project = tk_json(path, &["project", "create", "Launch"])["id"]
        .as_i64()
        .expect("id")
        .to_string();
    create_task(path, "a", &["--project", &project, "-p", "low"]);

    let report = tk_json(path, &["report", "project", &project]);
    assert_eq!(report["kind"], "project");
    let markdown = report["markdown"].as_str().expect("markdown");
    assert!(markdown.starts_with("# Launch Summary"));
    assert!(markdown.contains("- LOW: 1"));

    tk_cmd(path)
        .args(["report", "project", "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn resource_views_match_their_queries() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path();
    create_task(path, "hi", &["-p", "high", "-s", "completed"]);
    create_task(path, "open", &[]);
    tk_json(path, &["project", "create", "P"]);

    assert_eq!(tk_json(path, &["view", "task://all"])["count"], 2);
    assert_eq!(titles(&tk_json(path, &["view", "task://pending"])), vec!["open"]);
    assert_eq!(titles(&tk_json(path, &["view", "task://high-priority"])), vec!["hi"]);
    assert_eq!(tk_json(path, &["view", "project://all"])["count"], 1);
    assert_eq!(tk_json(path, &["view", "stats://summary"])["total"], 2);

    tk_cmd(path).args(["view", "task://nope"]).assert().failure();
}

#[test]
fn project_view_pretty_output_matches_project_list() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path();
    tk_json(path, &["project", "create", "Launch", "-d", "Q3 release"]);

    let view = tk_cmd(path)
        .args(["view", "project://all", "--format", "pretty"])
        .output()
        .expect("run view");
    let list = tk_cmd(path)
        .args(["project", "list", "--format", "pretty"])
        .output()
        .expect("run list");
    assert!(view.status.success());
    let view_out = String::from_utf8_lossy(&view.stdout);
    assert!(view_out.starts_with("Projects (1)\n"));
    assert!(view_out.contains("Launch  (Q3 release)"));
    assert_eq!(view.stdout, list.stdout);
}

// ===========================================================================
// Input validation and output modes
// ===========================================================================

#[test]
fn create_rejects_bad_input_with_codes() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path();

    tk_cmd(path)
        .args(["task", "create", "x", "-p", "urgent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2005"));
    tk_cmd(path)
        .args(["task", "create", "x", "--due", "2024-02-30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2006"));
    tk_cmd(path)
        .args(["task", "create", "x", "--project", "77"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2003"));

    assert_eq!(tk_json(path, &["task", "list"])["count"], 0);
}

#[test]
fn text_mode_prints_tab_separated_rows() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path();
    create_task(path, "Row", &["-p", "low", "--due", "2030-01-02", "-t", "z"]);

    tk_cmd(path)
        .args(["task", "list", "--format", "text"])
        .assert()
        .success()
        .stdout("1\tlow\tpending\t2030-01-02\tz\tRow\n");
}

#[test]
fn completions_do_not_touch_the_database() {
    let dir = TempDir::new().expect("tempdir");
    tk_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tk"));
    assert!(!dir.path().join("tasks.db").exists());
}

#[test]
fn env_var_selects_database_when_flag_absent() {
    let dir = TempDir::new().expect("tempdir");
    let db = dir.path().join("nested").join("env.db");
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tk"));
    cmd.current_dir(dir.path())
        .env("TASKER_LOG", "error")
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env("TASKER_DB", &db)
        .args(["task", "create", "via env", "--json"])
        .assert()
        .success();
    assert!(db.exists());
}
