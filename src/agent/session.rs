//! Interactive chat session
//!
//! Provides the REPL around a [`ChatHistory`]:
//! - plain lines are sent to the chat-completion backend
//! - `/` commands inspect or change the session (see [`commands`](super::commands))
//! - `/exit`, Ctrl-C or Ctrl-D leave the loop

use std::sync::Arc;
use std::time::Instant;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde_json::{Map, Value};

use super::commands::{Command, parse_command};
use super::history::ChatHistory;
use super::message::{MessageMetadata, ResponseMetrics, Role};
use super::ui;
use super::{AgentError, AgentResult};
use crate::config::McpConfig;
use crate::mcp::McpClient;
use crate::provider::{ChatRequest, CompletionBackend};

/// Whether the loop should keep reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// An assistant reply as recorded in history
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Stored text; pretty-printed when the model answered with JSON
    pub text: String,
    pub metrics: ResponseMetrics,
    /// Parsed JSON reply, if any
    pub data: Option<Value>,
}

/// Model settings applied to every chat request
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    pub extra_body: Map<String, Value>,
}

pub struct ChatSession {
    history: ChatHistory,
    backend: Arc<dyn CompletionBackend>,
    settings: ChatSettings,
    mcp: McpConfig,
}

impl ChatSession {
    pub fn new(
        history: ChatHistory,
        backend: Arc<dyn CompletionBackend>,
        settings: ChatSettings,
        mcp: McpConfig,
    ) -> Self {
        Self {
            history,
            backend,
            settings,
            mcp,
        }
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    /// Record a user turn, ask the model, and record its reply
    ///
    /// The user turn is persisted before the request; if the request fails
    /// no assistant message is recorded and the error is returned.
    pub fn send(&mut self, input: &str) -> AgentResult<Reply> {
        if let Some(folded) = self.history.append(Role::User, input, None)? {
            ui::print_info(&format!("History compacted: {} messages folded into a summary", folded));
        }

        let request = ChatRequest::new(self.settings.model.clone(), self.history.api_messages())
            .temperature(self.history.temperature())
            .max_tokens(self.history.max_tokens())
            .extra(self.settings.extra_body.clone());

        let started = Instant::now();
        let spinner = ui::Spinner::start("Thinking...");
        let result = self.backend.complete(&request);
        spinner.stop();
        let response = result?;
        let response_time_ms = round_ms(started.elapsed().as_secs_f64() * 1000.0);

        let usage = response.usage();
        let metrics = ResponseMetrics {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total(),
            response_time_ms,
        };
        self.history
            .update_token_stats(metrics.prompt_tokens, metrics.completion_tokens, metrics.total_tokens)?;

        let (text, data) = structure_reply(response.content().unwrap_or_default());
        let metadata = MessageMetadata::Metrics {
            metrics: metrics.clone(),
            data: data.clone(),
        };
        if let Some(folded) = self.history.append(Role::Assistant, text.clone(), Some(metadata))? {
            ui::print_info(&format!("History compacted: {} messages folded into a summary", folded));
        }

        Ok(Reply { text, metrics, data })
    }

    /// Execute a slash command
    ///
    /// `/clear` is executed as-is; confirmation belongs to the caller.
    pub fn handle_command(&mut self, command: Command) -> AgentResult<Flow> {
        match command {
            Command::Show(limit) => {
                ui::print_history(self.history.show_history(limit), self.history.len());
            }
            Command::Sessions => {
                let sessions = self
                    .history
                    .store()
                    .list_sessions()
                    .map_err(super::history::HistoryError::from)?;
                ui::print_sessions(&sessions, Some(self.history.session_name()));
            }
            Command::New(name) => {
                self.history.create_session(name.as_deref())?;
                ui::print_success(&format!("New session created: {}", self.history.session_name()));
            }
            Command::Load(name) => {
                self.history.load_session(&name)?;
                ui::print_success(&format!(
                    "Session loaded: {} ({} messages)",
                    name,
                    self.history.len()
                ));
                let tokens = self.history.token_stats();
                if tokens.request_count > 0 {
                    ui::print_info(&tokens.format_compact());
                }
            }
            Command::Export(file) => {
                let path = self.history.export(file.as_deref())?;
                ui::print_success(&format!("History exported to: {}", path.display()));
            }
            Command::Clear => {
                self.history.clear()?;
                ui::print_success("History cleared");
            }
            Command::Temperature(value) => {
                self.history.set_temperature(Some(value))?;
                ui::print_success(&format!("Temperature set to {}", value));
            }
            Command::MaxTokens(limit) => {
                self.history.set_max_tokens(limit)?;
                match limit {
                    Some(n) => ui::print_success(&format!("Response token limit set to {}", n)),
                    None => ui::print_success("Response token limit removed"),
                }
            }
            Command::Limit(None) => {
                ui::print_info(&format!(
                    "Current compaction threshold: {} messages",
                    self.history.compress_after()
                ));
            }
            Command::Limit(Some(value)) => {
                self.history.set_compress_after(value)?;
                ui::print_success(&format!("Compaction threshold set to {}", value));
            }
            Command::Tokens => ui::print_token_stats(&self.history.token_stats()),
            Command::SystemPrompt(prompt) => {
                let cleared = prompt.is_none();
                self.history.set_system_prompt(prompt)?;
                if cleared {
                    ui::print_success("System prompt cleared");
                } else {
                    ui::print_success("System prompt updated");
                }
            }
            Command::Tools => {
                let client = McpClient::from_config(&self.mcp)?;
                let spinner = ui::Spinner::start("Querying MCP server...");
                let tools = client.list_tools();
                spinner.stop();
                match tools {
                    Ok(tools) => ui::print_tools(&tools, client.base_url()),
                    Err(e) => {
                        ui::print_info(&format!(
                            "Check that the MCP server is running at {}",
                            client.base_url()
                        ));
                        return Err(e.into());
                    }
                }
            }
            Command::Help => ui::print_help(),
            Command::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    /// Run the read-eval-print loop until the user exits
    pub fn run(&mut self) -> AgentResult<()> {
        let mut editor = DefaultEditor::new().map_err(|e| AgentError::Input(e.to_string()))?;
        ui::print_welcome(self.history.session_name(), &self.settings.model);

        loop {
            let line = match editor.readline("you> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(AgentError::Input(e.to_string())),
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            let _ = editor.add_history_entry(input);

            let outcome = match parse_command(input) {
                None => self.send(input).map(|reply| {
                    ui::print_reply(&reply.text, &reply.metrics, &self.history.token_stats());
                    Flow::Continue
                }),
                Some(Err(message)) => {
                    ui::print_error(&message);
                    Ok(Flow::Continue)
                }
                Some(Ok(Command::Clear)) if !confirm(&mut editor)? => {
                    ui::print_info("Clear cancelled");
                    Ok(Flow::Continue)
                }
                Some(Ok(command)) => self.handle_command(command),
            };

            match outcome {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => ui::print_error(&e.to_string()),
            }
        }

        println!("Goodbye!");
        Ok(())
    }
}

fn confirm(editor: &mut DefaultEditor) -> AgentResult<bool> {
    match editor.readline("Are you sure? (yes/no): ") {
        Ok(answer) => Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(false),
        Err(e) => Err(AgentError::Input(e.to_string())),
    }
}

/// Milliseconds rounded to two decimals
fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

/// Pretty-print replies that are JSON objects or arrays
fn structure_reply(raw: &str) -> (String, Option<Value>) {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value) if value.is_object() || value.is_array() => {
            let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| raw.to_string());
            (pretty, Some(value))
        }
        _ => (raw.to_string(), None),
    }
}
