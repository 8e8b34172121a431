//! marionette CLI — load, validate, and plan YAML manifests.

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "marionette",
    version,
    about = "Declarative resource manifests: recipes, catalogs, and realization plans"
)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: marionette::cli::Commands,
}

fn main() {
    let cli = Cli::parse();

    let default = if cli.verbose { "marionette=debug" } else { "marionette=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    if let Err(e) = marionette::cli::dispatch(cli.command) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
