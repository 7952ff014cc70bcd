//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_DB_PATH;

/// proposal-advisor: classify portfolio questions and explain proposals.
///
/// Reads enriched proposals (violated constraints and suggested orders)
/// from a `SQLite` database and uses an OpenAI-compatible model to
/// classify questions and write client-facing advice.
#[derive(Parser, Debug)]
#[command(name = "proposal-advisor")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the proposal database file.
    ///
    /// Defaults to `data/proposals.db` in the current directory.
    #[arg(short, long, env = "ADVISOR_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json, ndjson).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// What to do when a store read fails (best-effort, fail-fast).
    #[arg(
        long,
        env = "ADVISOR_FETCH_POLICY",
        default_value = "best-effort",
        global = true
    )]
    pub fetch_policy: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the proposal database.
    ///
    /// Creates the database file and both proposal tables.
    #[command(after_help = r"Examples:
  proposal-advisor init                     # Create data/proposals.db
  proposal-advisor init --sample            # ...and seed sample proposal 557
  proposal-advisor init --force             # Re-initialize (destroys existing data)
  proposal-advisor --db-path ./p.db init    # Initialize with custom path
")]
    Init {
        /// Force re-initialization (destroys existing data).
        #[arg(short, long)]
        force: bool,

        /// Seed the bundled sample proposal.
        #[arg(short, long)]
        sample: bool,
    },

    /// Classify a question into a query intent.
    #[command(after_help = r#"Examples:
  proposal-advisor classify "Why was selling AAPL proposed?"
  proposal-advisor --format json classify "Which markets open up if we buy bonds?"
"#)]
    Classify {
        /// The question to classify.
        query: String,

        /// Directory containing prompt template files.
        #[arg(long)]
        prompt_dir: Option<PathBuf>,
    },

    /// Show violated constraints and suggested orders for a proposal.
    ///
    /// Reads the proposal id from stdin when not given.
    #[command(after_help = r"Examples:
  proposal-advisor details 557
  echo 557 | proposal-advisor --format json details
")]
    Details {
        /// Enriched proposal id.
        id: Option<i64>,
    },

    /// Export details for every proposal as JSON.
    Export {
        /// Output file (defaults to `data/all_enriched_proposal_details.json`).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write plain-language advice for a proposal.
    ///
    /// Reads the proposal id from stdin when not given.
    #[command(after_help = r"Examples:
  proposal-advisor advise 557
  proposal-advisor advise 557 --prompt-dir ./prompts
")]
    Advise {
        /// Enriched proposal id.
        id: Option<i64>,

        /// Directory containing prompt template files.
        #[arg(long)]
        prompt_dir: Option<PathBuf>,
    },

    /// Prompt template operations.
    #[command(subcommand)]
    Prompts(PromptsCommands),
}

/// Prompt template subcommands.
#[derive(Subcommand, Debug)]
pub enum PromptsCommands {
    /// Write the default prompt templates for editing.
    ///
    /// Existing files are left untouched.
    Init {
        /// Target directory (defaults to `~/.config/proposal-advisor/prompts`).
        dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Returns the database path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
    }
}
