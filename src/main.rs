mod catalog;
mod cli;
mod commands;
mod config;
mod corpus;
mod document;
mod error;
mod matcher;
mod model;
mod pdf;
mod pipeline;
mod scoring;
mod segment;
mod util;
mod vocabulary;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(args) => commands::detect::run(args),
        Commands::Evaluate(args) => commands::evaluate::run(args),
        Commands::Catalog(args) => commands::catalog::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
