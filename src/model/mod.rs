pub mod column;
pub mod config;
pub mod project;
pub mod row;

pub use column::*;
pub use config::*;
pub use project::*;
pub use row::*;
