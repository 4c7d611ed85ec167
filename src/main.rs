use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paytpv::interfaces::cli::{self, Cli};
use std::io;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let stdout = io::stdout();
    cli::run(cli, &mut stdout.lock()).into_diagnostic()?;

    Ok(())
}
