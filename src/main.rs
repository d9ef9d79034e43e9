mod classifier;
mod cli;
mod codec;
mod db;
mod error;
mod issues;
mod ledger;
mod models;
mod settings;
mod source;
mod sync;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() {
    let cli = Cli::parse();
    let settings = match settings::load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::sync::run(cli.path.as_deref(), &settings) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
