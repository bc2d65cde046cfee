#![forbid(unsafe_code)]

pub(crate) mod claude_code;
pub(crate) mod openai;
pub(crate) mod output_schema;
pub(crate) mod replay;

use crate::prompt::build_prompt;
use clap::ValueEnum;
use std::path::PathBuf;
use tc_core::interpret::{interpretation_from_value, parse_interpretation};
use tc_core::{Interpretation, InterpretationError, Interpreter, RelatedRowSet, RelationshipGraph};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum ExecutorKind {
    #[value(name = "claude_code")]
    ClaudeCode,
    #[value(name = "openai")]
    OpenAi,
    #[value(name = "replay")]
    Replay,
}

impl ExecutorKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ExecutorKind::ClaudeCode => "claude_code",
            ExecutorKind::OpenAi => "openai",
            ExecutorKind::Replay => "replay",
        }
    }

    pub(crate) fn parse(raw: &str) -> Result<Self, String> {
        <Self as ValueEnum>::from_str(raw.trim(), true)
            .map_err(|_| format!("unknown interpreter kind: {raw}"))
    }
}

/// Fully resolved executor choice for one run.
#[derive(Clone, Debug)]
pub(crate) enum Executor {
    ClaudeCode {
        claude_bin: String,
        model: Option<String>,
        work_dir: PathBuf,
    },
    OpenAi {
        api_url: String,
        api_key: String,
        model: String,
    },
    Replay {
        path: PathBuf,
    },
}

impl Executor {
    pub(crate) fn kind(&self) -> ExecutorKind {
        match self {
            Executor::ClaudeCode { .. } => ExecutorKind::ClaudeCode,
            Executor::OpenAi { .. } => ExecutorKind::OpenAi,
            Executor::Replay { .. } => ExecutorKind::Replay,
        }
    }

    fn reply(&self, prompt: &str, current: &RelatedRowSet) -> Result<Interpretation, String> {
        match self {
            Executor::ClaudeCode {
                claude_bin,
                model,
                work_dir,
            } => {
                let schema_json = output_schema::interpretation_schema_json_arg()?;
                let structured = claude_code::run(&claude_code::ClaudeRequest {
                    claude_bin,
                    schema_json: &schema_json,
                    prompt,
                    model: model.as_deref(),
                    work_dir,
                })?;
                let reply = output_schema::reply_from_structured(structured)?;
                interpretation_from_value(reply, current).map_err(|e| e.0)
            }
            Executor::OpenAi {
                api_url,
                api_key,
                model,
            } => {
                let text = openai::complete(api_url, api_key, model, prompt)?;
                parse_interpretation(&text, current).map_err(|e| e.0)
            }
            Executor::Replay { path } => {
                let text = replay::read_reply(path)?;
                parse_interpretation(&text, current).map_err(|e| e.0)
            }
        }
    }
}

/// Builds the prompt from the current rows and hands it to an executor.
pub(crate) struct PromptedInterpreter<'g> {
    graph: &'g RelationshipGraph,
    executor: Executor,
}

impl<'g> PromptedInterpreter<'g> {
    pub(crate) fn new(graph: &'g RelationshipGraph, executor: Executor) -> Self {
        Self { graph, executor }
    }
}

impl Interpreter for PromptedInterpreter<'_> {
    fn interpret(
        &mut self,
        current: &RelatedRowSet,
        message: &str,
    ) -> Result<Interpretation, InterpretationError> {
        let prompt = build_prompt(self.graph, current, message);
        info!(executor = self.executor.kind().as_str(), "interpreting message");
        debug!(prompt_chars = prompt.chars().count(), "prompt built");
        self.executor
            .reply(&prompt, current)
            .map_err(InterpretationError::new)
    }
}
