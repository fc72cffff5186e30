use std::time::{Duration, Instant};

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use serde_json::json;

use crate::grid::{LayoutStore, MemoryLayoutStore};
use crate::model::{Project, ProjectConfig, Record, Table, TableConfig};
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

pub const BACKLOG_TOML: &str = r#"
[project]
name = "Test"

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
filterable = "list"
format = "tag"

[[tables.columns]]
key = "points"
label = "Size"
width = 80
hidden_during_generation = true
format = "points"

[[tables.actions]]
label = "Mark done"
field = "status"
value = "Done"

[[tables]]
id = "sprints"
name = "Sprints"
file = "tables/sprints.json"

[[tables.columns]]
key = "name"
width = 160
"#;

fn row(id: i64, name: &str, status: &str, points: i64) -> Record {
    Record::new(
        id,
        [
            ("name".to_string(), json!(name)),
            ("status".to_string(), json!(status)),
            ("points".to_string(), json!(points)),
        ],
    )
}

/// Project with a three-row backlog and an empty second table, rooted in
/// a fresh temp directory so saves have somewhere to go.
pub fn backlog_project() -> Project {
    let config: ProjectConfig = toml::from_str(BACKLOG_TOML).unwrap();
    let root = tempfile::tempdir().unwrap().keep();
    let grid_dir = root.join("grid");
    std::fs::create_dir_all(&grid_dir).unwrap();
    let tables = config
        .tables
        .iter()
        .map(|t: &TableConfig| Table {
            config: t.clone(),
            rows: Vec::new(),
        })
        .collect();
    let mut project = Project {
        root,
        grid_dir,
        config,
        tables,
    };
    project.table_mut("backlog").unwrap().rows = vec![
        row(1, "Login", "Todo", 3),
        row(2, "Signup", "Done", 5),
        row(3, "Logout", "Todo", 1),
    ];
    project
}

/// App over `backlog_project()` with in-memory layout stores
pub fn app_with_backlog() -> App {
    App::with_store(backlog_project(), || {
        Box::new(MemoryLayoutStore::new()) as Box<dyn LayoutStore>
    })
}

/// Put `n` reviewable ghost rows into the active table
pub fn load_ghosts(app: &mut App, n: usize) {
    let rows: Vec<Record> = (1..=n)
        .map(|i| {
            Record::new(
                -(i as i64),
                [
                    ("name".to_string(), json!(format!("Draft {}", i))),
                    ("status".to_string(), json!("Todo")),
                ],
            )
        })
        .collect();
    let t0 = Instant::now();
    let ghosts = app.current_mut().unwrap().grid.ghosts_mut();
    ghosts.begin_loading(n, Duration::from_secs(2), t0).unwrap();
    ghosts.finish_loading(rows, t0).unwrap();
    ghosts.tick(t0 + Duration::from_secs(1));
}
