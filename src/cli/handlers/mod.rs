mod init;
pub use init::cmd_init;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::grid::{GhostLifecycle, Grid, ResetScope, SortDirection};
use crate::io::layout_io::FileLayoutStore;
use crate::io::project_io::{self, ProjectError};
use crate::model::{FilterKind, Project, Record, RowId, Table};
use crate::ops::generate::{GenerationJob, MAX_BATCH, RowGenerator, TemplateGenerator};
use crate::ops::row_ops;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let dir = cli.project_dir.as_deref();

    match cli.command {
        // No subcommand → launch TUI
        None => crate::tui::run(dir),
        Some(cmd) => match cmd {
            // Init runs before any project exists
            Commands::Init(args) => cmd_init(args, dir),

            // Read commands
            Commands::Tables => cmd_tables(dir, json),
            Commands::List(args) => cmd_list(args, dir, json),
            Commands::Columns(args) => cmd_columns(args, dir, json),
            Commands::Candidates(args) => cmd_candidates(args, dir, json),

            // Write commands
            Commands::Width(args) => cmd_width(args, dir, json),
            Commands::Delete(args) => cmd_delete(args, dir, json),
            Commands::Generate(args) => cmd_generate(args, dir, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_project_at(dir: Option<&str>) -> Result<Project, Box<dyn std::error::Error>> {
    let start = match dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir().map_err(ProjectError::IoError)?,
    };
    let root = project_io::discover_project(&start)?;
    Ok(project_io::load_project(&root)?)
}

fn find_table<'a>(project: &'a Project, table_id: &str) -> Result<&'a Table, ProjectError> {
    project
        .table(table_id)
        .ok_or_else(|| ProjectError::UnknownTable(table_id.to_string()))
}

/// A grid over one table, sharing the project's persisted layout
fn open_grid(project: &Project, table_id: &str) -> Result<Grid<Record>, ProjectError> {
    let table = find_table(project, table_id)?;
    let defs = table.config.columns.iter().map(|c| c.to_column_def()).collect();
    Ok(Grid::new(
        &table.config.id,
        defs,
        Box::new(FileLayoutStore::new(&project.grid_dir)),
        GhostLifecycle::from_config(&project.config.ghost),
    ))
}

/// Split a `KEY=VALUE` argument
fn parse_pair(arg: &str) -> Result<(&str, &str), String> {
    arg.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got \"{}\"", arg))
}

/// The column exists and filters the way the flag expects
fn require_filter(grid: &Grid<Record>, key: &str, expected: FilterKind) -> Result<(), String> {
    match grid.columns().column(key).map(|c| c.filterable) {
        None => Err(format!("unknown column: {}", key)),
        Some(None) => Err(format!("{} is not filterable", key)),
        Some(Some(kind)) if kind != expected => Err(match kind {
            FilterKind::List => format!("{} is a list filter; use --filter {}=VALUE", key, key),
            FilterKind::SearchOnly => format!("{} is a search filter; use --search {}=TEXT", key, key),
        }),
        Some(Some(_)) => Ok(()),
    }
}

/// Rows as an aligned text table: id, then each visible column as displayed
fn row_lines(grid: &Grid<Record>, rows: &[&Record], is_ghost: bool) -> Vec<String> {
    let columns = grid.columns().visible_columns();
    let mut headers = vec!["ID".to_string()];
    headers.extend(columns.iter().map(|c| c.label.to_uppercase()));
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut line = vec![row.id().to_string()];
            line.extend(columns.iter().map(|c| grid.cell_text(row, &c.key, is_ghost)));
            line
        })
        .collect();
    format_table(&headers, &cells)
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_tables(dir: Option<&str>, json: bool) -> CmdResult {
    let project = load_project_at(dir)?;
    let tables: Vec<TableInfoJson> = project
        .tables
        .iter()
        .map(|t| TableInfoJson {
            id: t.config.id.clone(),
            name: t.config.name.clone(),
            file: t.config.file.clone(),
            rows: t.rows.len(),
        })
        .collect();
    if json {
        return print_json(&tables);
    }
    let headers = ["ID", "NAME", "ROWS"].map(String::from);
    let rows: Vec<Vec<String>> = tables
        .iter()
        .map(|t| vec![t.id.clone(), t.name.clone(), t.rows.to_string()])
        .collect();
    for line in format_table(&headers, &rows) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_list(args: ListArgs, dir: Option<&str>, json: bool) -> CmdResult {
    let project = load_project_at(dir)?;
    let mut grid = open_grid(&project, &args.table)?;
    let rows = &find_table(&project, &args.table)?.rows;

    if let Some(key) = &args.sort {
        let column = grid
            .columns()
            .column(key)
            .ok_or_else(|| format!("unknown column: {}", key))?;
        if !column.sortable {
            return Err(format!("{} is not sortable", key).into());
        }
        let direction = if args.desc { SortDirection::Desc } else { SortDirection::Asc };
        grid.toggle_sort(key, direction);
    }
    for arg in &args.filter {
        let (key, value) = parse_pair(arg)?;
        require_filter(&grid, key, FilterKind::List)?;
        grid.set_filter(key, value, rows);
    }
    for arg in &args.search {
        let (key, text) = parse_pair(arg)?;
        require_filter(&grid, key, FilterKind::SearchOnly)?;
        grid.set_filter(key, text, rows);
    }

    let visible = grid.visible_rows(rows);
    if json {
        return print_json(&RowListJson {
            table: args.table,
            total: rows.len(),
            rows: visible.iter().map(|r| (*r).clone().into_value()).collect(),
        });
    }
    if visible.is_empty() {
        println!("(no rows)");
        return Ok(());
    }
    for line in row_lines(&grid, &visible, false) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_columns(args: ColumnsArgs, dir: Option<&str>, json: bool) -> CmdResult {
    let project = load_project_at(dir)?;
    let grid = open_grid(&project, &args.table)?;
    let columns = columns_to_json(grid.columns());
    if json {
        return print_json(&columns);
    }
    for line in format_columns(&columns) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_candidates(args: CandidatesArgs, dir: Option<&str>, json: bool) -> CmdResult {
    let project = load_project_at(dir)?;
    let grid = open_grid(&project, &args.table)?;
    require_filter(&grid, &args.column, FilterKind::List)?;
    let rows = &find_table(&project, &args.table)?.rows;
    let values = grid.candidates(rows, &args.column, args.search.as_deref().unwrap_or(""));
    if json {
        return print_json(&values);
    }
    for value in &values {
        println!("{}", value);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_width(args: WidthArgs, dir: Option<&str>, json: bool) -> CmdResult {
    let project = load_project_at(dir)?;
    let mut grid = open_grid(&project, &args.table)?;

    if args.reset_all {
        grid.reset_width("", ResetScope::All);
        if json {
            return print_json(&WidthJson {
                table: args.table,
                column: None,
                width: None,
                reset: true,
            });
        }
        println!("{}: all column widths reset", args.table);
        return Ok(());
    }

    let column = args.column.ok_or("a column is required")?;
    if grid.columns().column(&column).is_none() {
        return Err(format!("unknown column: {}", column).into());
    }
    let width = if args.reset {
        grid.reset_width(&column, ResetScope::Column);
        grid.width(&column)
    } else {
        let px = args.px.ok_or("a width is required")?;
        grid.set_width(&column, px)
    };
    if json {
        return print_json(&WidthJson {
            table: args.table,
            column: Some(column),
            width,
            reset: args.reset,
        });
    }
    match (width, args.reset) {
        (Some(w), true) => println!("{}: {}px (default)", column, w),
        (Some(w), false) if args.px.is_some_and(|px| px != w) => {
            println!("{}: {}px (clamped to minimum)", column, w)
        }
        (Some(w), false) => println!("{}: {}px", column, w),
        (None, _) => println!("{}: width unchanged", column),
    }
    Ok(())
}

fn cmd_delete(args: DeleteArgs, dir: Option<&str>, json: bool) -> CmdResult {
    let mut project = load_project_at(dir)?;
    let mut grid = open_grid(&project, &args.table)?;
    let table = find_table(&project, &args.table)?;
    if !table.config.deletable {
        return Err(format!("rows in table {} cannot be deleted", args.table).into());
    }

    for token in &args.ids {
        let id = RowId::parse(token);
        if !table.rows.iter().any(|r| r.id() == id) {
            return Err(format!("no row with id {} in {}", id, args.table).into());
        }
        if !grid.selection().contains(&id) {
            grid.toggle_select(id);
        }
    }

    let mut removed = Vec::new();
    let mut failure = None;
    grid.selection_mut().delete_with(|ids| {
        let Some(table) = project.table_mut(&args.table) else {
            return false;
        };
        removed = row_ops::delete_rows(&mut table.rows, ids);
        match project_io::save_after_delete(&project, &args.table, &removed) {
            Ok(()) => true,
            Err(e) => {
                failure = Some(e);
                false
            }
        }
    });
    if let Some(e) = failure {
        return Err(e.into());
    }

    if json {
        return print_json(&DeleteJson {
            table: args.table,
            deleted: removed.into_iter().map(Record::into_value).collect(),
        });
    }
    let noun = if removed.len() == 1 { "row" } else { "rows" };
    println!("deleted {} {} from {}", removed.len(), noun, args.table);
    Ok(())
}

fn cmd_generate(args: GenerateArgs, dir: Option<&str>, json: bool) -> CmdResult {
    if args.count == 0 || args.count > MAX_BATCH {
        return Err(format!("row count must be between 1 and {}", MAX_BATCH).into());
    }
    let mut project = load_project_at(dir)?;
    let mut grid = open_grid(&project, &args.table)?;
    let generator = TemplateGenerator::for_table(find_table(&project, &args.table)?, &project.config.ghost);
    let grace = Duration::from_millis(project.config.ghost.grace_ms);

    // Same lifecycle as the TUI, with the clock advanced past the grace delay
    let estimate = generator.estimated_duration(args.count);
    grid.ghosts_mut().begin_loading(args.count, estimate, Instant::now())?;
    let items = match GenerationJob::spawn(Arc::new(generator), args.count).wait() {
        Ok(items) => items,
        Err(e) => {
            grid.ghosts_mut().abort();
            return Err(e.into());
        }
    };
    let done = Instant::now();
    if grid.ghosts_mut().finish_loading(items, done)?.is_some() {
        if json {
            return print_json(&GenerateJson {
                table: args.table,
                generated: 0,
                accepted: 0,
                rejected: 0,
                rows: Vec::new(),
            });
        }
        println!("generator returned no rows");
        return Ok(());
    }
    grid.ghosts_mut().tick(done + grace);

    let generated = grid.ghosts().items().len();
    let preview = if json {
        Vec::new()
    } else {
        let ghosts: Vec<&Record> = grid.ghosts().items().iter().collect();
        row_lines(&grid, &ghosts, true)
    };
    let preview_values: Vec<_> = grid.ghosts().items().iter().map(|r| r.clone().into_value()).collect();

    let (summary, rows) = if args.accept {
        let table = project
            .table_mut(&args.table)
            .ok_or_else(|| ProjectError::UnknownTable(args.table.clone()))?;
        let mut accepted = Vec::new();
        let summary = grid.ghosts_mut().accept_all(|ghost| {
            let id = row_ops::merge_ghost(&mut table.rows, ghost);
            if let Some(row) = table.rows.iter().find(|r| r.id() == id) {
                accepted.push(row.clone().into_value());
            }
        })?;
        project_io::save_table(&project, &args.table)?;
        (summary, accepted)
    } else {
        (grid.ghosts_mut().reject_all()?, preview_values)
    };

    if json {
        return print_json(&GenerateJson {
            table: args.table,
            generated,
            accepted: summary.accepted,
            rejected: summary.rejected,
            rows,
        });
    }
    for line in preview {
        println!("{}", line);
    }
    if args.accept {
        println!("accepted {} rows into {}", summary.accepted, args.table);
    } else if args.reject {
        println!("rejected {} rows", summary.rejected);
    } else {
        println!("rejected {} rows (use --accept to keep them)", summary.rejected);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_split_on_first_equals() {
        assert_eq!(parse_pair("status=Todo"), Ok(("status", "Todo")));
        assert_eq!(parse_pair("name=a=b"), Ok(("name", "a=b")));
        assert_eq!(parse_pair("name="), Ok(("name", "")));
        assert!(parse_pair("=x").is_err());
        assert!(parse_pair("status").is_err());
    }
}
