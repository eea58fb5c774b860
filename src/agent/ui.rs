//! Terminal output for the chat client
//!
//! Colored rendering of history, sessions, token statistics and tool
//! listings, plus the spinner shown while a completion is in flight.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::commands::SLASH_COMMANDS;
use super::message::{Message, ResponseMetrics, Role};
use super::persistence::{SessionInfo, SessionTokens, format_relative_time};
use crate::mcp::McpTool;

const RULE_WIDTH: usize = 70;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn thin_rule() -> String {
    "─".repeat(RULE_WIDTH)
}

/// Print the welcome banner
pub fn print_welcome(session: &str, model: &str) {
    println!();
    println!("  {} {}", "parley".cyan().bold(), format!("v{}", crate::VERSION).dimmed());
    println!("  Chatting with {} · session {}", model.cyan(), session.yellow());
    println!(
        "  {}",
        format!("Type {} for commands, {} to quit.", "/help".yellow(), "/exit".yellow()).dimmed()
    );
    println!();
}

/// Print the command list
pub fn print_help() {
    println!("\n{}", rule());
    println!("{}", "COMMANDS".bold());
    println!("{}", rule());
    for cmd in SLASH_COMMANDS {
        let usage = if cmd.args.is_empty() {
            format!("/{}", cmd.name)
        } else {
            format!("/{} {}", cmd.name, cmd.args)
        };
        let alias = cmd
            .alias
            .map(|a| format!("(/{})", a))
            .unwrap_or_default();
        println!(
            "  {:<18} {:<6} {}",
            usage.cyan(),
            alias.dimmed(),
            cmd.description
        );
    }
    println!("{}\n", rule());
}

fn role_label(role: Role) -> colored::ColoredString {
    let label = role.as_str().to_uppercase();
    match role {
        Role::User => label.green().bold(),
        Role::Assistant => label.magenta().bold(),
        Role::System => label.yellow().bold(),
        Role::Tool => label.blue().bold(),
    }
}

/// Print messages with index, role, timestamp and any metadata
pub fn print_history(messages: &[Message], total: usize) {
    println!("\n{}", rule());
    println!(
        "{} {}",
        "CHAT HISTORY".bold(),
        format!("({} of {} messages)", messages.len(), total).dimmed()
    );
    println!("{}", rule());

    if messages.is_empty() {
        println!("{}", "History is empty".dimmed());
        println!("{}\n", rule());
        return;
    }

    let offset = total.saturating_sub(messages.len());
    for (i, message) in messages.iter().enumerate() {
        let mut header = format!(
            "\n[{}] {} ({})",
            offset + i + 1,
            role_label(message.role),
            message.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
        if message.is_summary() {
            header.push_str(&format!(" {}", "summary".yellow()));
        }
        println!("{}", header);
        println!("{}", thin_rule().dimmed());
        println!("{}", textwrap::fill(&message.content, RULE_WIDTH));

        if let Some(metadata) = &message.metadata {
            let value = serde_json::Value::from(metadata.clone());
            if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                println!("{} {}", "metadata:".dimmed(), pretty.dimmed());
            }
        }
    }
    println!("\n{}\n", rule());
}

/// Print stored sessions, marking the active one
pub fn print_sessions(sessions: &[SessionInfo], current: Option<&str>) {
    if sessions.is_empty() {
        println!("{}", "No saved sessions found.".yellow());
        return;
    }

    println!();
    println!("{}", format!("Saved Sessions ({})", sessions.len()).cyan().bold());
    println!();

    for (i, session) in sessions.iter().enumerate() {
        let marker = if current == Some(session.name.as_str()) {
            "*".green().bold().to_string()
        } else {
            " ".to_string()
        };
        let details = match (session.saved_at, session.message_count) {
            (Some(saved), Some(count)) => {
                format!("{} messages, saved {}", count, format_relative_time(saved))
            }
            _ => "unreadable".to_string(),
        };
        println!(
            " {} {} {} {}",
            marker,
            format!("[{}]", i + 1).cyan(),
            session.name.white(),
            format!("({})", details).dimmed()
        );
    }
    println!();
}

/// Print session token counters with per-request averages
pub fn print_token_stats(tokens: &SessionTokens) {
    println!("\n{}", rule());
    println!("{}", "SESSION TOKEN STATISTICS".bold());
    println!("{}", rule());

    if tokens.request_count == 0 {
        println!("{}", "No requests in this session yet".dimmed());
    } else {
        let requests = tokens.request_count as f64;
        println!("Requests:           {}", tokens.request_count);
        println!("Prompt tokens:      {}", tokens.prompt_tokens);
        println!("Completion tokens:  {}", tokens.completion_tokens);
        println!("Total tokens:       {}", tokens.total_tokens);
        println!("\n{}", "Averages per request:".dimmed());
        println!("  Prompt:           {:.1}", tokens.prompt_tokens as f64 / requests);
        println!("  Completion:       {:.1}", tokens.completion_tokens as f64 / requests);
        println!("  Total:            {:.1}", tokens.total_tokens as f64 / requests);
    }
    println!("{}\n", rule());
}

/// Print an assistant reply with its request metrics
pub fn print_reply(text: &str, metrics: &ResponseMetrics, session: &SessionTokens) {
    println!(
        "\n{}",
        format!(
            "{:.0} ms · {} prompt + {} completion = {} tokens · session: {}",
            metrics.response_time_ms,
            metrics.prompt_tokens,
            metrics.completion_tokens,
            metrics.total_tokens,
            session.format_compact()
        )
        .dimmed()
    );
    println!("\n{}", "assistant ›".magenta().bold());
    println!("{}\n", text);
}

/// Print tools and their parameters
pub fn print_tools(tools: &[McpTool], server: &str) {
    println!("\n{}", rule());
    println!("{} {}", "TOOLS FROM".bold(), server.cyan());
    println!("{}", rule());

    if tools.is_empty() {
        println!("{}", "No tools found or the server did not respond".yellow());
    }

    for (i, tool) in tools.iter().enumerate() {
        println!("\n[{}] {}", i + 1, tool.name.cyan().bold());
        println!(
            "    {}",
            tool.description.as_deref().unwrap_or("No description")
        );

        let params = tool.parameters();
        if !params.is_empty() {
            println!("    {}", "Parameters:".dimmed());
            for (name, param, required) in params {
                let req = if required { " *".red().to_string() } else { String::new() };
                println!("      - {} ({}){}", name, param.type_name(), req);
                if let Some(desc) = &param.description {
                    println!("        {}", desc.dimmed());
                }
            }
        }
    }
    println!("\n{}\n", rule());
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".cyan(), message);
}

/// Spinner shown while waiting on the network
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn start(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "]));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    pub fn stop(self) {
        self.bar.finish_and_clear();
    }
}
