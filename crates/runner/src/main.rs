#![forbid(unsafe_code)]

mod bin_detect;
mod defaults;
mod executors;
mod prompt;
mod render;

use clap::{Args, Parser, Subcommand};
use executors::{Executor, ExecutorKind, PromptedInterpreter};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tc_core::{Config, InterpreterConfig, RelationshipGraph, RowIdentifier};
use tc_storage::RelationalStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CLAUDE_BIN: &str = "claude";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tablechat: update related SQLite rows from plain-language messages"
)]
struct Cli {
    /// Relationship config (YAML or JSON). Defaults to tablechat.yaml at the repository root.
    #[arg(long, global = true, env = "TC_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the relationship graph and print its tables, foreign keys and roots.
    Check,
    /// Print the rows related to one identifier.
    Show(TargetArgs),
    /// Interpret a message against one identifier's rows and apply it.
    Message(MessageArgs),
}

#[derive(Args, Debug, Clone)]
struct TargetArgs {
    /// Table of the starting row, `schema.table`.
    #[arg(long)]
    table: String,
    /// Column that identifies the starting row.
    #[arg(long)]
    id_column: String,
    #[arg(long)]
    id_value: String,
}

impl TargetArgs {
    fn identifier(&self) -> RowIdentifier {
        RowIdentifier::new(
            self.table.as_str(),
            self.id_column.as_str(),
            Value::String(self.id_value.clone()),
        )
    }
}

#[derive(Args, Debug)]
struct MessageArgs {
    #[command(flatten)]
    target: TargetArgs,
    #[arg(long)]
    message: String,
    #[arg(long, value_enum)]
    executor: Option<ExecutorKind>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long, env = "TC_CLAUDE_BIN")]
    claude_bin: Option<String>,
    /// Chat-completions endpoint for the openai executor.
    #[arg(long, env = "TC_OPENAI_URL")]
    api_url: Option<String>,
    /// Reply file for the replay executor.
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Print the confirmation sentence instead of the JSON report.
    #[arg(long)]
    text: bool,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf, String> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("current dir unavailable: {e}"))?;
    Ok(defaults::default_config_path_from_start(&cwd))
}

/// Command line first, then the config's `interpreter` section, then
/// whatever is available: a replay file, a `claude` on PATH, or OpenAI.
fn resolve_executor(
    args: &MessageArgs,
    config: &InterpreterConfig,
    work_dir: &Path,
    openai_key: Option<String>,
) -> Result<Executor, String> {
    let configured = config
        .kind
        .as_deref()
        .map(ExecutorKind::parse)
        .transpose()?;
    let claude_bin = bin_detect::resolve_optional_bin(
        args.claude_bin.as_deref().or(config.claude_bin.as_deref()),
        DEFAULT_CLAUDE_BIN,
    );
    let kind = match args.executor.or(configured) {
        Some(kind) => kind,
        None if args.replay.is_some() => ExecutorKind::Replay,
        None if claude_bin.is_some() => ExecutorKind::ClaudeCode,
        None => ExecutorKind::OpenAi,
    };
    let model = args.model.clone().or_else(|| config.model.clone());

    match kind {
        ExecutorKind::ClaudeCode => Ok(Executor::ClaudeCode {
            claude_bin: claude_bin.ok_or_else(|| {
                "claude_code executor is not configured (set --claude-bin or TC_CLAUDE_BIN)"
                    .to_string()
            })?,
            model,
            work_dir: work_dir.to_path_buf(),
        }),
        ExecutorKind::OpenAi => Ok(Executor::OpenAi {
            api_url: args
                .api_url
                .clone()
                .or_else(|| config.api_url.clone())
                .unwrap_or_else(|| executors::openai::DEFAULT_API_URL.to_string()),
            api_key: openai_key
                .ok_or_else(|| "openai executor needs OPENAI_API_KEY".to_string())?,
            model: model.unwrap_or_else(|| executors::openai::DEFAULT_MODEL.to_string()),
        }),
        ExecutorKind::Replay => Ok(Executor::Replay {
            path: args
                .replay
                .clone()
                .ok_or_else(|| "replay executor needs --replay FILE".to_string())?,
        }),
    }
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = resolve_config_path(cli.config)?;
    let config = Config::load(&config_path)?;
    let graph = RelationshipGraph::build(&config.schema)?;
    let base_dir = defaults::config_base_dir(&config_path);
    info!(
        config = %config_path.display(),
        tables = graph.tables().len(),
        "relationship graph loaded"
    );

    match cli.command {
        Command::Check => print_json(&render::graph_summary(&graph))?,
        Command::Show(target) => {
            let store = RelationalStore::open_configured(&config.database, &base_dir)?;
            let (_, related) = store.fetch_related(&graph, &target.identifier())?;
            print_json(&related.to_json())?;
        }
        Command::Message(args) => {
            let executor =
                resolve_executor(&args, &config.interpreter, &base_dir, env_var("OPENAI_API_KEY"))?;
            let mut interpreter = PromptedInterpreter::new(&graph, executor);
            let mut store = RelationalStore::open_configured(&config.database, &base_dir)?;
            let outcome = store.process_message(
                &graph,
                &args.target.identifier(),
                &args.message,
                &mut interpreter,
            )?;
            if args.text {
                println!("{}", render::confirmation_text(&outcome));
            } else {
                print_json(&render::report_json(&outcome))?;
            }
        }
    }
    Ok(())
}
