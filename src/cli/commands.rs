//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

// Allow certain patterns that improve readability in CLI output formatting
#![allow(clippy::format_push_string)]

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::agent::{AdvisorAgent, PromptSet, QueryClassifier, create_provider};
use crate::agent::config::AgentConfig;
use crate::aggregate::ProposalAggregator;
use crate::cli::output::{OutputFormat, format_advice, format_classification, format_details};
use crate::cli::parser::{Cli, Commands, PromptsCommands};
use crate::config::{AppConfig, DEFAULT_EXPORT_PATH, FetchPolicy, StoreConfig};
use crate::error::{CommandError, Result, StorageError};
use crate::storage::SqliteStorage;
use crate::storage::fixtures::seed_sample;

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let config = load_config(cli)?;

    match &cli.command {
        Commands::Init { force, sample } => {
            cmd_init(&config.store.db_path, *force, *sample, format)
        }
        Commands::Classify { query, .. } => cmd_classify(&config, query, format),
        Commands::Details { id } => cmd_details(&config.store, *id, format),
        Commands::Export { output } => cmd_export(&config.store, output.as_deref(), format),
        Commands::Advise { id, .. } => cmd_advise(&config, *id, format),
        Commands::Prompts(PromptsCommands::Init { dir }) => {
            cmd_init_prompts(dir.as_deref(), format)
        }
    }
}

/// Builds the application configuration from flags and environment.
///
/// A command-level `--prompt-dir` overrides `ADVISOR_PROMPT_DIR`.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let fetch_policy = FetchPolicy::parse(&cli.fetch_policy).ok_or_else(|| {
        CommandError::InvalidInput(format!(
            "unknown fetch policy '{}' (expected best-effort or fail-fast)",
            cli.fetch_policy
        ))
    })?;

    let store = StoreConfig {
        db_path: cli.get_db_path(),
        fetch_policy,
    };

    let mut builder = AgentConfig::builder();
    if let Commands::Classify {
        prompt_dir: Some(dir),
        ..
    }
    | Commands::Advise {
        prompt_dir: Some(dir),
        ..
    } = &cli.command
    {
        builder = builder.prompt_dir(dir);
    }

    Ok(AppConfig::new(store, builder.from_env().build())?)
}

/// Opens storage and ensures it's initialized.
fn open_storage(db_path: &Path) -> Result<SqliteStorage> {
    if !db_path.exists() {
        return Err(StorageError::NotInitialized.into());
    }

    let storage = SqliteStorage::open(db_path)?;
    if !storage.is_initialized()? {
        return Err(StorageError::NotInitialized.into());
    }

    Ok(storage)
}

/// Returns `id`, or reads one integer proposal id from stdin.
fn resolve_proposal_id(id: Option<i64>) -> Result<i64> {
    if let Some(id) = id {
        return Ok(id);
    }

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    parse_proposal_id(&line)
}

fn parse_proposal_id(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    trimmed.parse::<i64>().map_err(|_| {
        CommandError::InvalidInput(format!(
            "expected an integer enriched_proposal_id, got '{trimmed}'"
        ))
        .into()
    })
}

/// Creates a single-threaded runtime to drive one async call.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
        })
}

// ==================== Command Implementations ====================

fn cmd_init(db_path: &Path, force: bool, sample: bool, format: OutputFormat) -> Result<String> {
    // Check if already exists
    if db_path.exists() && !force {
        return Err(CommandError::ExecutionFailed(
            "Database already exists. Use --force to reinitialize.".to_string(),
        )
        .into());
    }

    // Create parent directory if needed
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            CommandError::ExecutionFailed(format!("Failed to create directory: {e}"))
        })?;
    }

    // If force, delete existing
    if force && db_path.exists() {
        std::fs::remove_file(db_path).map_err(|e| {
            CommandError::ExecutionFailed(format!("Failed to remove existing database: {e}"))
        })?;
    }

    let mut storage = SqliteStorage::open(db_path)?;
    storage.init()?;

    let seeded = if sample {
        seed_sample(&mut storage)?
    } else {
        0
    };
    info!(path = %db_path.display(), seeded, "initialized proposal database");

    match format {
        OutputFormat::Text => {
            let mut out = format!("Initialized proposal database at: {}\n", db_path.display());
            if sample {
                out.push_str(&format!("Seeded sample proposal ({seeded} rows).\n"));
            }
            Ok(out)
        }
        OutputFormat::Json | OutputFormat::Ndjson => {
            let json = serde_json::json!({
                "success": true,
                "path": db_path.to_string_lossy(),
                "force": force,
                "seeded_rows": seeded
            });
            Ok(format.to_json(&json))
        }
    }
}

fn cmd_classify(config: &AppConfig, query: &str, format: OutputFormat) -> Result<String> {
    let agent_config = config.require_agent()?;
    let provider = create_provider(agent_config)?;
    let prompts = PromptSet::load(agent_config.prompt_dir.as_deref());
    let classifier = QueryClassifier::new(agent_config, prompts.classifier);

    let result = runtime()?.block_on(classifier.classify(provider.as_ref(), query))?;
    info!(is_error = result.is_error(), "classification finished");

    Ok(format_classification(&result, format))
}

fn cmd_details(store: &StoreConfig, id: Option<i64>, format: OutputFormat) -> Result<String> {
    let proposal_id = resolve_proposal_id(id)?;
    let storage = open_storage(&store.db_path)?;

    let details =
        ProposalAggregator::new(&storage, store.fetch_policy).get_details(proposal_id)?;
    Ok(format_details(&details, format))
}

fn cmd_export(store: &StoreConfig, output: Option<&Path>, format: OutputFormat) -> Result<String> {
    let storage = open_storage(&store.db_path)?;
    let all =
        ProposalAggregator::new(&storage, store.fetch_policy).get_details_for_all_proposals()?;

    let path = output.map_or_else(|| PathBuf::from(DEFAULT_EXPORT_PATH), Path::to_path_buf);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(&all)
        .map_err(|e| CommandError::OutputFormat(e.to_string()))?;
    std::fs::write(&path, json)?;
    info!(path = %path.display(), proposals = all.len(), "exported proposal details");

    match format {
        OutputFormat::Text => Ok(format!(
            "Exported {} proposal(s) to: {}\n",
            all.len(),
            path.display()
        )),
        OutputFormat::Json | OutputFormat::Ndjson => {
            let json = serde_json::json!({
                "path": path.to_string_lossy(),
                "count": all.len(),
                "degraded": all.iter().filter(|d| d.is_degraded()).count()
            });
            Ok(format.to_json(&json))
        }
    }
}

fn cmd_advise(config: &AppConfig, id: Option<i64>, format: OutputFormat) -> Result<String> {
    let agent_config = config.require_agent()?;
    let proposal_id = resolve_proposal_id(id)?;
    let storage = open_storage(&config.store.db_path)?;

    let details = ProposalAggregator::new(&storage, config.store.fetch_policy)
        .get_details(proposal_id)?;

    let provider = create_provider(agent_config)?;
    let prompts = PromptSet::load(agent_config.prompt_dir.as_deref());
    let advisor = AdvisorAgent::new(agent_config, prompts.advisor);

    let advice = runtime()?.block_on(advisor.advise(provider.as_ref(), &details))?;
    info!(proposal_id, "advice generated");

    Ok(format_advice(&advice, format))
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                output.push_str(&format!(
                    "  {}\n",
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown")
                ));
            }
            output.push_str("\nEdit these files to customize the system prompts.\n");
            Ok(output)
        }
        OutputFormat::Json | OutputFormat::Ndjson => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("proposal-advisor").chain(args.iter().copied()))
            .unwrap()
    }

    fn db(dir: &TempDir) -> String {
        dir.path().join("proposals.db").to_string_lossy().into_owned()
    }

    #[test]
    fn test_init_creates_database() {
        let dir = TempDir::new().unwrap();
        let path = db(&dir);
        let out = execute(&cli(&["--db-path", &path, "init"])).unwrap();
        assert!(out.contains("Initialized proposal database"));

        // Second init without --force refuses
        assert!(execute(&cli(&["--db-path", &path, "init"])).is_err());
        assert!(execute(&cli(&["--db-path", &path, "init", "--force"])).is_ok());
    }

    #[test]
    fn test_details_for_sample() {
        let dir = TempDir::new().unwrap();
        let path = db(&dir);
        execute(&cli(&["--db-path", &path, "init", "--sample"])).unwrap();

        let out = execute(&cli(&["--db-path", &path, "--format", "json", "details", "557"]))
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["enriched_proposal_id"], 557);
        assert_eq!(
            json["enriched_proposal_evaluated_constraints"][0]["name"],
            "32% < Equity < 50%"
        );
        assert_eq!(json["enriched_proposals_orders"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_details_unknown_proposal_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = db(&dir);
        execute(&cli(&["--db-path", &path, "init"])).unwrap();

        let out = execute(&cli(&["--db-path", &path, "details", "1"])).unwrap();
        assert!(out.contains("Violated constraints (0)"));
        assert!(out.contains("Orders (0)"));
    }

    #[test]
    fn test_details_requires_init() {
        let dir = TempDir::new().unwrap();
        let path = db(&dir);
        let err = execute(&cli(&["--db-path", &path, "details", "1"])).unwrap_err();
        assert!(err.to_string().contains("init"));
    }

    #[test]
    fn test_export_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = db(&dir);
        let out_path = dir.path().join("out").join("all.json");
        execute(&cli(&["--db-path", &path, "init", "--sample"])).unwrap();

        let out = execute(&cli(&[
            "--db-path",
            &path,
            "export",
            "--output",
            &out_path.to_string_lossy(),
        ]))
        .unwrap();
        assert!(out.contains("Exported 1 proposal(s)"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
        assert_eq!(written.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_fetch_policy() {
        let err = execute(&cli(&["--fetch-policy", "sometimes", "export"])).unwrap_err();
        assert!(err.to_string().contains("fetch policy"));
    }

    #[test]
    fn test_init_prompts() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("prompts");
        let out = cmd_init_prompts(Some(&target), OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["count"], 2);

        let again = cmd_init_prompts(Some(&target), OutputFormat::Text).unwrap();
        assert!(again.contains("already exist"));
    }

    #[test]
    fn test_parse_proposal_id() {
        assert_eq!(parse_proposal_id(" 557\n").unwrap(), 557);
        assert!(parse_proposal_id("abc").is_err());
        assert!(parse_proposal_id("").is_err());
    }
}
