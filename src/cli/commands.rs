use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gridline", about = concat!("gridline v", env!("CARGO_PKG_VERSION"), " - tables you can sort, filter, resize and grow"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different project directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new gridline project in the current directory
    Init(InitArgs),
    /// List tables with row counts
    Tables,
    /// List a table's rows, sorted and filtered
    List(ListArgs),
    /// Show a table's visible columns and their widths
    Columns(ColumnsArgs),
    /// Set or reset column widths
    Width(WidthArgs),
    /// Show the values a list filter can pick from
    Candidates(CandidatesArgs),
    /// Permanently delete rows
    Delete(DeleteArgs),
    /// Generate draft rows and accept or reject them
    Generate(GenerateArgs),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Project name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Add a sample backlog table with a few rows
    #[arg(long)]
    pub sample: bool,
    /// Reinitialize even if grid/ already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Table to list
    pub table: String,
    /// Sort by this column
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,
    /// Exact-value filter on a list-filterable column (repeatable)
    #[arg(long, value_name = "KEY=VALUE")]
    pub filter: Vec<String>,
    /// Substring filter on a search-only column (repeatable)
    #[arg(long, value_name = "KEY=TEXT")]
    pub search: Vec<String>,
}

#[derive(Args)]
pub struct ColumnsArgs {
    /// Table whose columns to show
    pub table: String,
}

#[derive(Args)]
pub struct CandidatesArgs {
    /// Table to read
    pub table: String,
    /// List-filterable column
    pub column: String,
    /// Narrow the values by substring
    #[arg(long)]
    pub search: Option<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct WidthArgs {
    /// Table the column belongs to
    pub table: String,
    /// Column key
    #[arg(required_unless_present = "reset_all")]
    pub column: Option<String>,
    /// New width in pixels
    #[arg(required_unless_present_any = ["reset", "reset_all"], conflicts_with_all = ["reset", "reset_all"])]
    pub px: Option<u32>,
    /// Drop the column's override
    #[arg(long, conflicts_with = "reset_all")]
    pub reset: bool,
    /// Drop every override for the table
    #[arg(long)]
    pub reset_all: bool,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Table to delete from
    pub table: String,
    /// Row ids
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Table to generate rows for
    pub table: String,
    /// Number of rows (1-20)
    pub count: usize,
    /// Keep every generated row
    #[arg(long, conflicts_with = "reject")]
    pub accept: bool,
    /// Discard every generated row (preview only)
    #[arg(long)]
    pub reject: bool,
}
