//! CLI module for eateum-rag.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// eateum-rag - ingredient-based recipe recommendation
///
/// Retrieves candidate recipes by embedding similarity, then re-ranks them by
/// how many of your ingredients each recipe actually uses.
#[derive(Parser, Debug)]
#[command(name = "eateum-rag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP recommendation server
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Recommend recipes for a list of ingredients
    Recommend {
        /// Ingredients, e.g. `김치 두부 "돼지고기"`
        ingredients: Vec<String>,
    },

    /// Run a raw similarity search against the recipe index
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity score (-1.0 to 1.0)
        #[arg(short, long, default_value = "0.0")]
        min_score: f32,
    },

    /// Build the recipe index from a CSV file
    Ingest {
        /// Path to the recipe CSV
        csv: PathBuf,

        /// Remove every indexed recipe before ingesting
        #[arg(long)]
        reset: bool,

        /// Append cooking steps to the embedded text
        #[arg(long)]
        with_steps: bool,
    },

    /// Check configuration and environment
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recommend() {
        let cli = Cli::try_parse_from(["eateum-rag", "recommend", "김치", "두부"]).unwrap();
        match cli.command {
            Commands::Recommend { ingredients } => assert_eq!(ingredients, vec!["김치", "두부"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ingest_flags() {
        let cli = Cli::try_parse_from([
            "eateum-rag",
            "-vv",
            "ingest",
            "recipes.csv",
            "--reset",
            "--with-steps",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ingest { csv, reset, with_steps } => {
                assert_eq!(csv, PathBuf::from("recipes.csv"));
                assert!(reset);
                assert!(with_steps);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_overrides_are_optional() {
        let cli = Cli::try_parse_from(["eateum-rag", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { host: None, port: None }));
    }
}
