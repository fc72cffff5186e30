use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery;
use crate::io::rows_io::{self, RowsError};
use crate::model::config::ProjectConfig;
use crate::model::project::{Project, Table};
use crate::model::row::Record;

/// Error type for project I/O operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("not a gridline project: no grid/project.toml found")]
    NotAProject,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse project.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error(transparent)]
    Rows(#[from] RowsError),
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Discover the project by walking up from the given directory, looking for
/// a `grid/` subdirectory with a `project.toml`.
pub fn discover_project(start: &Path) -> Result<PathBuf, ProjectError> {
    let mut current = start.to_path_buf();
    loop {
        let grid_dir = current.join("grid");
        if grid_dir.is_dir() && grid_dir.join("project.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ProjectError::NotAProject);
        }
    }
}

/// Read and parse `grid/project.toml`.
pub fn read_config(grid_dir: &Path) -> Result<ProjectConfig, ProjectError> {
    let config_path = grid_dir.join("project.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| ProjectError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&config_text)?)
}

/// Load a complete project from the given root directory.
pub fn load_project(root: &Path) -> Result<Project, ProjectError> {
    let grid_dir = root.join("grid");
    if !grid_dir.is_dir() {
        return Err(ProjectError::NotAProject);
    }
    let config = read_config(&grid_dir)?;

    let mut tables = Vec::with_capacity(config.tables.len());
    for table_config in &config.tables {
        let rows = rows_io::read_rows(&grid_dir.join(&table_config.file))?;
        tracing::debug!(table = %table_config.id, rows = rows.len(), "table loaded");
        tables.push(Table {
            config: table_config.clone(),
            rows,
        });
    }

    Ok(Project {
        root: root.to_path_buf(),
        grid_dir,
        config,
        tables,
    })
}

/// Re-read one table's rows from disk (after an external edit).
pub fn reload_table(project: &mut Project, table_id: &str) -> Result<(), ProjectError> {
    let grid_dir = project.grid_dir.clone();
    let table = project
        .table_mut(table_id)
        .ok_or_else(|| ProjectError::UnknownTable(table_id.to_string()))?;
    table.rows = rows_io::read_rows(&grid_dir.join(&table.config.file))?;
    Ok(())
}

/// Save one table's rows back to disk.
pub fn save_table(project: &Project, table_id: &str) -> Result<(), ProjectError> {
    let table = project
        .table(table_id)
        .ok_or_else(|| ProjectError::UnknownTable(table_id.to_string()))?;
    rows_io::write_rows(&project.grid_dir, &table.config.file, &table.rows)?;
    Ok(())
}

/// Save a table after rows were removed from it, keeping the removed rows
/// in the recovery log.
pub fn save_after_delete(project: &Project, table_id: &str, removed: &[Record]) -> Result<(), ProjectError> {
    let values: Vec<serde_json::Value> = removed.iter().map(|r| r.clone().into_value()).collect();
    recovery::log_row_deletion(&project.grid_dir, table_id, &values);
    save_table(project, table_id)?;
    tracing::info!(table = table_id, rows = removed.len(), "rows deleted");
    Ok(())
}

/// Which table, if any, a changed path belongs to
pub fn table_for_path<'a>(project: &'a Project, path: &Path) -> Option<&'a str> {
    project
        .tables
        .iter()
        .find(|t| project.grid_dir.join(&t.config.file) == path)
        .map(|t| t.config.id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::row::RowId;
    use tempfile::TempDir;

    fn create_test_project(dir: &Path) {
        let grid_dir = dir.join("grid");
        fs::create_dir_all(grid_dir.join("tables")).unwrap();
        fs::write(
            grid_dir.join("project.toml"),
            r#"
[project]
name = "test"

[[tables]]
id = "backlog"
name = "Backlog"
file = "tables/backlog.json"

[[tables.columns]]
key = "name"
width = 200

[[tables]]
id = "sizes"
name = "Sizes"
file = "tables/sizes.json"
"#,
        )
        .unwrap();
        fs::write(
            grid_dir.join("tables/backlog.json"),
            r#"[{"id": 1, "name": "First"}, {"id": 2, "name": "Second"}]"#,
        )
        .unwrap();
    }

    #[test]
    fn test_discover_project() {
        let tmp = TempDir::new().unwrap();
        create_test_project(tmp.path());

        let root = discover_project(tmp.path()).unwrap();
        assert_eq!(root, tmp.path());

        let sub = tmp.path().join("grid/tables");
        let root = discover_project(&sub).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn test_discover_project_not_found() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            discover_project(tmp.path()),
            Err(ProjectError::NotAProject)
        ));
    }

    #[test]
    fn test_load_project() {
        let tmp = TempDir::new().unwrap();
        create_test_project(tmp.path());

        let project = load_project(tmp.path()).unwrap();
        assert_eq!(project.config.project.name, "test");
        assert_eq!(project.tables.len(), 2);
        assert_eq!(project.table("backlog").unwrap().rows.len(), 2);
        // Missing row file is an empty table
        assert!(project.table("sizes").unwrap().rows.is_empty());
    }

    #[test]
    fn save_and_reload_table() {
        let tmp = TempDir::new().unwrap();
        create_test_project(tmp.path());
        let mut project = load_project(tmp.path()).unwrap();

        project.table_mut("backlog").unwrap().rows.remove(0);
        save_table(&project, "backlog").unwrap();

        project.table_mut("backlog").unwrap().rows.clear();
        reload_table(&mut project, "backlog").unwrap();
        let rows = &project.table("backlog").unwrap().rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id(), RowId::Num(2));

        assert!(matches!(
            save_table(&project, "nope"),
            Err(ProjectError::UnknownTable(_))
        ));
    }

    #[test]
    fn bad_row_file_fails_load() {
        let tmp = TempDir::new().unwrap();
        create_test_project(tmp.path());
        fs::write(
            tmp.path().join("grid/tables/backlog.json"),
            r#"[{"id": 1}, {"id": 1}]"#,
        )
        .unwrap();
        assert!(matches!(
            load_project(tmp.path()),
            Err(ProjectError::Rows(RowsError::DuplicateId { .. }))
        ));
    }

    #[test]
    fn path_maps_to_table() {
        let tmp = TempDir::new().unwrap();
        create_test_project(tmp.path());
        let project = load_project(tmp.path()).unwrap();
        let path = project.grid_dir.join("tables/sizes.json");
        assert_eq!(table_for_path(&project, &path), Some("sizes"));
        assert_eq!(table_for_path(&project, Path::new("/elsewhere")), None);
    }
}
