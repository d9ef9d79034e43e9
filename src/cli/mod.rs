pub mod sync;

use std::path::PathBuf;

use clap::Parser;

/// Synchronize accounts and their transactions with the accounting CSV.
///
/// New project codes become accounts with their project, country fund,
/// memorial or sector campaign. Known codes get their balance refreshed and
/// transactions already covered by the export removed.
#[derive(Parser)]
#[command(name = "sync-accounting", version)]
pub struct Cli {
    /// Path to the accounting CSV export
    pub path: Option<PathBuf>,
}
