//! Command-line configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XMLB_LOG_LEVEL` | warn | Log level |
//! | `XMLB_INDENT` | 2 | Indentation of written markup |

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "xmlb")]
#[command(about = "Format, resolve and inspect xmlb markup")]
pub struct CliConfig {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "XMLB_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    /// Spaces per nesting level; 0 writes a single line.
    #[arg(long, env = "XMLB_INDENT", default_value = "2", global = true)]
    pub indent: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Re-indent a document.
    Format {
        input: PathBuf,
        /// Write here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inline every include directive of a document.
    ResolveIncludes {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the element tree as JSON.
    Json {
        input: PathBuf,
        /// Resolve includes first.
        #[arg(long)]
        resolve: bool,
    },
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl CliConfig {
    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "Log level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.log_level
            ));
        }

        if self.indent > 16 {
            errors.push("Indent cannot exceed 16".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::try_parse_from(["xmlb", "format", "a.xml"]).unwrap();
        assert_eq!(config.indent, 2);
        assert!(config.validate().is_ok());
        assert!(matches!(config.command, Command::Format { output: None, .. }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let config =
            CliConfig::try_parse_from(["xmlb", "json", "a.xml", "--resolve", "--indent", "0"]).unwrap();
        assert_eq!(config.indent, 0);
        assert!(matches!(config.command, Command::Json { resolve: true, .. }));
    }

    #[test]
    fn test_validate_reports_every_error() {
        let config = CliConfig::try_parse_from([
            "xmlb",
            "--log-level",
            "loud",
            "--indent",
            "40",
            "format",
            "a.xml",
        ])
        .unwrap();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
