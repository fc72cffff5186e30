//! Integration tests for the `gridline` CLI.
//!
//! Each test creates a temp project directory, runs `gridline` as a
//! subprocess, and verifies stdout and/or file contents.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use pretty_assertions::assert_eq;

/// Get the path to the built `gridline` binary.
fn gridline_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gridline"))
}

/// Create a test project with a backlog table in the given directory.
fn create_test_project(root: &Path) {
    let grid_dir = root.join("grid");
    fs::create_dir_all(grid_dir.join("tables")).unwrap();

    fs::write(
        grid_dir.join("project.toml"),
        r#"[project]
name = "test-project"

[ghost]
duration_ms = 0
grace_ms = 0

[[tables]]
id = "backlog"
name = "Backlog"
file = "tables/backlog.json"

[[tables.columns]]
key = "name"
label = "Title"
width = 200
sortable = true
filterable = "search-only"

[[tables.columns]]
key = "status"
label = "Status"
width = 100
sortable = true
filterable = "list"
format = "tag"

[[tables.columns]]
key = "points"
label = "Size"
width = 80
sortable = true
min_width = 60
format = "points"

[[tables]]
id = "log"
name = "Log"
file = "tables/log.json"
deletable = false

[[tables.columns]]
key = "name"
"#,
    )
    .unwrap();

    fs::write(
        grid_dir.join("tables/backlog.json"),
        r#"[
  { "id": 1, "name": "Login page", "status": "Todo", "points": 3 },
  { "id": 2, "name": "Signup form", "status": "Done", "points": 5 },
  { "id": 3, "name": "Logout button", "status": "Todo", "points": 1 },
  { "id": 4, "name": "Password reset", "status": "Blocked", "points": 8 }
]
"#,
    )
    .unwrap();
    fs::write(grid_dir.join("tables/log.json"), r#"[{ "id": "a", "name": "boot" }]"#).unwrap();
}

/// Run `gridline` with the given args in the given directory, returning (stdout, stderr, success).
fn run_gridline(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(gridline_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("GRIDLINE_LOG")
        .output()
        .expect("failed to run gridline");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `gridline` expecting success, return stdout.
fn run_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_gridline(dir, args);
    if !success {
        panic!(
            "gridline {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

/// Run `gridline` expecting failure, return stderr.
fn run_err(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_gridline(dir, args);
    assert!(!success, "gridline {:?} should fail, got: {}", args, stdout);
    stderr
}

fn json(out: &str) -> serde_json::Value {
    serde_json::from_str(out).unwrap()
}

fn ids(value: &serde_json::Value) -> Vec<i64> {
    value["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect()
}

fn read_rows(root: &Path) -> Vec<serde_json::Value> {
    let text = fs::read_to_string(root.join("grid/tables/backlog.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[test]
fn test_init_with_sample() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ok(tmp.path(), &["init", "--name", "Demo", "--sample"]);
    assert!(out.contains("Initialized gridline project: Demo"));
    assert!(tmp.path().join("grid/project.toml").exists());

    let out = run_ok(tmp.path(), &["tables"]);
    assert!(out.contains("backlog"));
    assert!(out.contains("4"));
}

#[test]
fn test_init_refuses_existing_project() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let err = run_err(tmp.path(), &["init"]);
    assert!(err.contains("already exists"));
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

#[test]
fn test_tables() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let out = run_ok(tmp.path(), &["tables"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "ID       NAME     ROWS");
    assert_eq!(lines[1], "backlog  Backlog  4");
    assert_eq!(lines[2], "log      Log      1");
}

#[test]
fn test_list_text() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let out = run_ok(tmp.path(), &["list", "backlog"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "ID  TITLE           STATUS     SIZE");
    assert_eq!(lines[1], "1   Login page      [Todo]     3 pts");
    assert_eq!(lines.len(), 5);
}

#[test]
fn test_list_sorted_and_filtered() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let out = run_ok(
        tmp.path(),
        &["list", "backlog", "--sort", "points", "--desc", "--json"],
    );
    assert_eq!(ids(&json(&out)), vec![4, 2, 1, 3]);

    let out = run_ok(
        tmp.path(),
        &["list", "backlog", "--filter", "status=Todo", "--sort", "name", "--json"],
    );
    let value = json(&out);
    assert_eq!(ids(&value), vec![1, 3]);
    assert_eq!(value["total"], 4);

    let out = run_ok(
        tmp.path(),
        &["list", "backlog", "--search", "name=LOG", "--filter", "status=Todo", "--json"],
    );
    assert_eq!(ids(&json(&out)), vec![1, 3]);
}

#[test]
fn test_list_rejects_wrong_filter_kind() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let err = run_err(tmp.path(), &["list", "backlog", "--filter", "name=Login"]);
    assert!(err.contains("use --search"));
    let err = run_err(tmp.path(), &["list", "backlog", "--filter", "points=3"]);
    assert!(err.contains("not filterable"));
    let err = run_err(tmp.path(), &["list", "nope"]);
    assert!(err.contains("unknown table: nope"));
}

#[test]
fn test_list_no_matches() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let out = run_ok(tmp.path(), &["list", "backlog", "--search", "name=zzz"]);
    assert_eq!(out.trim(), "(no rows)");
}

#[test]
fn test_candidates() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let out = run_ok(tmp.path(), &["candidates", "backlog", "status", "--json"]);
    let values: Vec<String> = serde_json::from_str(&out).unwrap();
    assert_eq!(values.len(), 3);
    assert!(values.contains(&"Blocked".to_string()));

    let out = run_ok(tmp.path(), &["candidates", "backlog", "status", "--search", "do"]);
    let mut lines: Vec<&str> = out.lines().collect();
    lines.sort();
    assert_eq!(lines, vec!["Done", "Todo"]);
}

#[test]
fn test_project_dir_flag() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let elsewhere = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().to_str().unwrap();
    let out = run_ok(elsewhere.path(), &["-C", dir, "tables"]);
    assert!(out.contains("backlog"));
}

#[test]
fn test_outside_project_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    let err = run_err(tmp.path(), &["tables"]);
    assert!(err.contains("not a gridline project"));
}

// ---------------------------------------------------------------------------
// Widths
// ---------------------------------------------------------------------------

#[test]
fn test_width_override_persists() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_ok(tmp.path(), &["width", "backlog", "name", "320"]);
    assert_eq!(out.trim(), "name: 320px");

    let layout = fs::read_to_string(tmp.path().join("grid/.layout.json")).unwrap();
    assert!(layout.contains("\"backlog:name\""));

    let out = run_ok(tmp.path(), &["columns", "backlog", "--json"]);
    let cols = json(&out);
    assert_eq!(cols[0]["width"], 320);
    assert_eq!(cols[0]["overridden"], true);
    assert_eq!(cols[1]["overridden"], false);

    let out = run_ok(tmp.path(), &["columns", "backlog"]);
    assert!(out.contains("(default 200px)"));
}

#[test]
fn test_width_clamps_to_minimum() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let out = run_ok(tmp.path(), &["width", "backlog", "points", "10"]);
    assert_eq!(out.trim(), "points: 60px (clamped to minimum)");
    let out = run_ok(tmp.path(), &["width", "backlog", "name", "10"]);
    assert_eq!(out.trim(), "name: 70px (clamped to minimum)");
}

#[test]
fn test_width_reset() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    run_ok(tmp.path(), &["width", "backlog", "name", "320"]);
    run_ok(tmp.path(), &["width", "backlog", "status", "150"]);

    let out = run_ok(tmp.path(), &["width", "backlog", "name", "--reset"]);
    assert_eq!(out.trim(), "name: 200px (default)");
    let cols = json(&run_ok(tmp.path(), &["columns", "backlog", "--json"]));
    assert_eq!(cols[1]["width"], 150);

    run_ok(tmp.path(), &["width", "backlog", "--reset-all"]);
    let cols = json(&run_ok(tmp.path(), &["columns", "backlog", "--json"]));
    assert_eq!(cols[1]["width"], 100);
    assert_eq!(cols[1]["overridden"], false);
}

#[test]
fn test_width_unknown_column() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let err = run_err(tmp.path(), &["width", "backlog", "nope", "100"]);
    assert!(err.contains("unknown column: nope"));
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn test_delete_rows() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let out = run_ok(tmp.path(), &["delete", "backlog", "1", "3"]);
    assert_eq!(out.trim(), "deleted 2 rows from backlog");

    let rows = read_rows(tmp.path());
    let remaining: Vec<i64> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(remaining, vec![2, 4]);

    let log = fs::read_to_string(tmp.path().join("grid/.recovery.log")).unwrap();
    assert!(log.contains("Login page"));
}

#[test]
fn test_delete_unknown_id_changes_nothing() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let err = run_err(tmp.path(), &["delete", "backlog", "1", "99"]);
    assert!(err.contains("no row with id 99"));
    assert_eq!(read_rows(tmp.path()).len(), 4);
}

#[test]
fn test_delete_not_allowed() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let err = run_err(tmp.path(), &["delete", "log", "a"]);
    assert!(err.contains("cannot be deleted"));
}

// ---------------------------------------------------------------------------
// Generate
// ---------------------------------------------------------------------------

#[test]
fn test_generate_preview_saves_nothing() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let out = run_ok(tmp.path(), &["generate", "backlog", "2"]);
    assert!(out.contains("Follow-up: Login page"));
    assert!(out.contains("rejected 2 rows (use --accept to keep them)"));
    assert_eq!(read_rows(tmp.path()).len(), 4);
}

#[test]
fn test_generate_accept_assigns_ids() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let out = run_ok(tmp.path(), &["generate", "backlog", "2", "--accept", "--json"]);
    let value = json(&out);
    assert_eq!(value["generated"], 2);
    assert_eq!(value["accepted"], 2);
    assert_eq!(value["rejected"], 0);

    let rows = read_rows(tmp.path());
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[4]["id"], 5);
    assert_eq!(rows[5]["id"], 6);
    // List-filter columns default to the most common value
    assert_eq!(rows[4]["status"], "Todo");
}

#[test]
fn test_generate_rejects_bad_counts() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let err = run_err(tmp.path(), &["generate", "backlog", "0"]);
    assert!(err.contains("between 1 and 20"));
    let err = run_err(tmp.path(), &["generate", "backlog", "21"]);
    assert!(err.contains("between 1 and 20"));
}
