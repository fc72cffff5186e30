use std::fs;
use std::path::PathBuf;

use crate::cli::commands::InitArgs;
use crate::io::project_io;

const PROJECT_TOML_TEMPLATE: &str = r##"[project]
name = "{name}"

# --- Tables ---
# Each table is a JSON array of row objects under grid/. Every row needs an
# "id" (integer or string).
#
# [[tables]]
# id = "example"
# name = "Example"
# file = "tables/example.json"
# multiselect = true
# deletable = true
#
# [[tables.columns]]
# key = "name"
# label = "Title"
# width = 260                 # pixels; the terminal draws 8 per cell
# sortable = true
# filterable = "search-only"  # or "list"
# format = "text"             # text | tag | points | progress | user

# --- Generated rows ---
[ghost]
duration_ms = 2000
ceiling = 90.0
grace_ms = 500
default_count = 3

# --- UI Customization ---
# Uncomment and edit to override defaults.

[ui]
# show_key_hints = true
# [ui.colors]
# background = "#0C001B"
# text = "#B0AAFF"
# text_bright = "#FFFFFF"
# highlight = "#FB4196"
# dim = "#7D78BF"
# accent = "#CC66FF"
# ghost = "#CC66FF"
# error = "#FF4444"
#
# [ui.tag_colors]
# Todo = "#4488FF"
# "In Progress" = "#FFD700"
# Blocked = "#FF4444"
# Done = "#44FF88"
"##;

const SAMPLE_TABLE: &str = r#"
[[tables]]
id = "backlog"
name = "Backlog"
file = "tables/backlog.json"

[[tables.columns]]
key = "name"
label = "Title"
width = 260
sortable = true
filterable = "search-only"

[[tables.columns]]
key = "status"
label = "Status"
width = 120
sortable = true
filterable = "list"
format = "tag"

[[tables.columns]]
key = "points"
label = "Size"
width = 80
sortable = true
hidden_during_generation = true
format = "points"

[[tables.actions]]
label = "Mark done"
field = "status"
value = "Done"
"#;

const SAMPLE_ROWS: &str = r#"[
  { "id": 1, "name": "Sketch the onboarding flow", "status": "Todo", "points": 3 },
  { "id": 2, "name": "Fix login redirect", "status": "In Progress", "points": 2 },
  { "id": 3, "name": "Write release notes", "status": "Todo", "points": 1 },
  { "id": 4, "name": "Audit error messages", "status": "Done", "points": 5 }
]
"#;

/// Infer a project name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + &chars.collect::<String>()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render project.toml, with the sample table appended when asked for.
fn render_project_toml(name: &str, sample: bool) -> String {
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    let mut toml = PROJECT_TOML_TEMPLATE.replace("{name}", &escaped);
    if sample {
        toml.push_str(SAMPLE_TABLE);
    }
    toml
}

pub fn cmd_init(args: InitArgs, project_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match project_dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let grid_dir = root.join("grid");

    // Check if already initialized
    if grid_dir.join("project.toml").exists() && !args.force {
        return Err("gridline project already exists in ./grid/ (use --force to reinitialize)".into());
    }

    // Check for parent project and warn
    if let Some(parent) = root.parent()
        && let Ok(parent_root) = project_io::discover_project(parent)
    {
        eprintln!("Note: parent project found at {}/", parent_root.join("grid").display());
        eprintln!("Creating new project in ./grid/");
    }

    let name = args.name.unwrap_or_else(|| {
        root.canonicalize()
            .ok()
            .and_then(|p| p.file_name().and_then(|n| n.to_str()).map(infer_name))
            .unwrap_or_else(|| "Untitled".to_string())
    });

    fs::create_dir_all(grid_dir.join("tables"))?;
    fs::write(grid_dir.join("project.toml"), render_project_toml(&name, args.sample))?;
    if args.sample {
        let rows_path = grid_dir.join("tables/backlog.json");
        if !rows_path.exists() {
            fs::write(rows_path, SAMPLE_ROWS)?;
        }
    }

    tracing::info!(root = %root.display(), sample = args.sample, "project initialized");
    println!("Initialized gridline project: {}", name);
    if args.sample {
        println!("  table: Backlog (backlog) [4 rows]");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rows_io;
    use crate::model::ProjectConfig;
    use std::path::Path;

    #[test]
    fn test_infer_name() {
        assert_eq!(infer_name("my-cool-project"), "My Cool Project");
        assert_eq!(infer_name("gridline"), "Gridline");
    }

    #[test]
    fn template_parses_without_tables() {
        let config: ProjectConfig = toml::from_str(&render_project_toml("Test", false)).unwrap();
        assert_eq!(config.project.name, "Test");
        assert!(config.tables.is_empty());
        assert_eq!(config.ghost.default_count, 3);
    }

    #[test]
    fn sample_table_parses() {
        let config: ProjectConfig = toml::from_str(&render_project_toml("Test", true)).unwrap();
        assert_eq!(config.tables.len(), 1);
        assert_eq!(config.tables[0].columns.len(), 3);
        assert_eq!(config.tables[0].actions[0].label, "Mark done");
        let rows = rows_io::parse_rows(SAMPLE_ROWS, Path::new("backlog.json")).unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let config: ProjectConfig =
            toml::from_str(&render_project_toml("The \"Big\" One", false)).unwrap();
        assert_eq!(config.project.name, "The \"Big\" One");
    }

    #[test]
    fn init_writes_grid_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_str().unwrap();
        let args = InitArgs {
            name: Some("Demo".into()),
            sample: true,
            force: false,
        };
        cmd_init(args, Some(dir)).unwrap();
        assert!(tmp.path().join("grid/project.toml").exists());
        assert!(tmp.path().join("grid/tables/backlog.json").exists());
        let project = project_io::load_project(tmp.path()).unwrap();
        assert_eq!(project.tables[0].rows.len(), 4);

        // A second init without --force refuses
        let again = InitArgs {
            name: None,
            sample: false,
            force: false,
        };
        assert!(cmd_init(again, Some(dir)).is_err());
    }
}
