use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the file watcher to the TUI event loop.
#[derive(Debug, PartialEq, Eq)]
pub enum FileEvent {
    /// One or more row files or the project config changed on disk.
    Changed(Vec<PathBuf>),
    /// Another process committed column widths.
    LayoutChanged,
}

/// Sort a changed path into an event, or None if it is not interesting.
fn classify(grid_dir: &Path, path: &Path) -> Option<FileEvent> {
    if !path.starts_with(grid_dir) {
        return None;
    }
    let name = path.file_name().and_then(|n| n.to_str())?;
    match name {
        ".layout.json" => Some(FileEvent::LayoutChanged),
        // Our own bookkeeping
        ".state.json" | ".recovery.log" | ".gridline.log" => None,
        _ => match path.extension().and_then(|e| e.to_str()) {
            Some("json") | Some("toml") => Some(FileEvent::Changed(vec![path.to_path_buf()])),
            _ => None,
        },
    }
}

/// A file system watcher for the grid/ directory.
pub struct GridWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

impl GridWatcher {
    /// Start watching the given `grid/` directory.
    /// Returns a `GridWatcher` whose `poll()` method should be called each tick.
    pub fn start(grid_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let grid_dir_owned = grid_dir.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };
                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                let mut changed = Vec::new();
                let mut layout = false;
                for path in &event.paths {
                    match classify(&grid_dir_owned, path) {
                        Some(FileEvent::Changed(mut paths)) => changed.append(&mut paths),
                        Some(FileEvent::LayoutChanged) => layout = true,
                        None => {}
                    }
                }
                if !changed.is_empty() {
                    let _ = tx.send(FileEvent::Changed(changed));
                }
                if layout {
                    let _ = tx.send(FileEvent::LayoutChanged);
                }
            },
            Config::default(),
        )?;

        watcher.watch(grid_dir, RecursiveMode::Recursive)?;
        Ok(GridWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending file events.
    /// Returns all queued events (may be empty).
    pub fn poll(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}
