//! CLI layer for proposal-advisor.
//!
//! Provides the command-line interface using clap, with commands for
//! initializing the proposal database, inspecting and exporting proposals,
//! classifying questions, and writing advice.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, PromptsCommands};
