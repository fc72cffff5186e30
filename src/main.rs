use clap::Parser;
use gridline::cli::commands::Cli;
use gridline::cli::handlers;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // The TUI owns the terminal and logs to grid/.gridline.log instead
    if cli.command.is_some() {
        init_stderr_logging();
    }

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `GRIDLINE_LOG` (default `warn`)
fn init_stderr_logging() {
    let filter = EnvFilter::try_from_env("GRIDLINE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
