//! Bakery CLI - container image targets from a declarative bakery.yaml
//!
//! This is the main entry point for the bakery command-line interface.

mod cli;
mod commands;
mod output;
mod version;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Must happen before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Version(args) => commands::version::run(args),
        Commands::Targets(args) => commands::targets::run(args, config).await,
        Commands::Plan(args) => commands::plan::run(args, config).await,
        Commands::Render(args) => commands::render::run(args, config).await,
        Commands::Build(args) => commands::build::run(args, config).await,
        Commands::Test(args) => commands::test::run(args, config).await,
        Commands::Scan(args) => commands::scan::run(args, config).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
