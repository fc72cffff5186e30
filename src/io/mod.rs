pub mod layout_io;
pub mod project_io;
pub mod recovery;
pub mod rows_io;
pub mod state;
pub mod watcher;
