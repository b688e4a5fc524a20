//! xmlb command-line tool
//!
//! Formats documents, inlines includes and prints the JSON form of an
//! element tree.

mod commands;
mod config;

use std::fs;

use clap::Parser;
use config::{CliConfig, Command};
use tracing::info;

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("xmlb={},xmlb_dom={}", level, level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn emit(text: String, output: Option<&std::path::Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text)?;
            info!(path = %path.display(), "Wrote output");
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    match &config.command {
        Command::Format { input, output } => {
            emit(commands::format(input, config.indent)?, output.as_deref())
        }
        Command::ResolveIncludes { input, output } => {
            emit(commands::resolve_includes(input, config.indent)?, output.as_deref())
        }
        Command::Json { input, resolve } => emit(commands::json(input, *resolve, config.indent)?, None),
    }
}
