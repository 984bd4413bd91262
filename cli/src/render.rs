//! Console formatting for turn events, action cards and the tool catalog

use colored::Colorize;
use vaultpilot_domain::{
    ActionCard, ActionStatus, CatalogSnapshot, StreamEvent, ToolInvocationResult, Verdict,
};

/// Formats pipeline output for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format one stream event. `None` means nothing to print.
    pub fn event(event: &StreamEvent) -> Option<String> {
        match event {
            StreamEvent::Text(text) => Some(text.clone()),
            StreamEvent::ToolCallRequested(call) => Some(format!(
                "\n{} {}",
                "→".dimmed(),
                call.name.cyan()
            )),
            StreamEvent::ToolResult(payload) => {
                let status = if payload.outcome.is_error {
                    "failed".red()
                } else {
                    "ok".green()
                };
                Some(format!(
                    "{} {} {}",
                    "←".dimmed(),
                    payload.tool_name.cyan(),
                    status
                ))
            }
            StreamEvent::ActionCard(card) => Some(Self::card(card)),
            StreamEvent::Metadata(meta) => Some(
                format!(
                    "[{} tools from {} servers, thread {}]",
                    meta.tool_count,
                    meta.servers.len(),
                    meta.thread_id
                )
                .dimmed()
                .to_string(),
            ),
            StreamEvent::Done(summary) if summary.pending_actions.is_empty() => None,
            StreamEvent::Done(summary) => Some(format!(
                "\n{} {} awaiting confirmation (/confirm <key> or /cancel <key>)",
                "!".yellow().bold(),
                summary.pending_actions.len()
            )),
            StreamEvent::Error(failure) if failure.cancelled => {
                Some(format!("\n{}", "Turn cancelled".yellow()))
            }
            StreamEvent::Error(failure) => Some(format!(
                "\n{} {}",
                "Error:".red().bold(),
                failure.message
            )),
        }
    }

    /// Format an action card with its operations and critic opinion
    pub fn card(card: &ActionCard) -> String {
        let mut output = String::new();
        let status = match card.status {
            ActionStatus::Pending => card.status.as_str().yellow().bold(),
            ActionStatus::Confirmed => card.status.as_str().cyan().bold(),
            ActionStatus::Completed => card.status.as_str().green().bold(),
            ActionStatus::Cancelled | ActionStatus::Failed => card.status.as_str().red().bold(),
        };

        output.push_str(&format!(
            "\n{} {} [{}]\n",
            "── Action ──".yellow().bold(),
            card.title,
            status
        ));
        output.push_str(&format!("  {} {}\n", "key:".dimmed(), card.id));
        output.push_str(&format!("  {} {}\n", "tool:".dimmed(), card.function_name));
        for operation in &card.operations {
            output.push_str(&format!("  * {}\n", operation.summary()));
        }

        match &card.assessment {
            Some(assessment) => {
                let verdict = match assessment.verdict {
                    Verdict::Approve => assessment.verdict.as_str().green(),
                    Verdict::Caution => assessment.verdict.as_str().yellow(),
                    Verdict::Reject => assessment.verdict.as_str().red(),
                };
                output.push_str(&format!("  {} {}", "critic:".dimmed(), verdict));
                if !assessment.reasoning.is_empty() {
                    output.push_str(&format!(" - {}", assessment.reasoning));
                }
                output.push('\n');
                for warning in &assessment.warnings {
                    output.push_str(&format!("    {} {}\n", "!".yellow(), warning));
                }
            }
            None => output.push_str(&format!(
                "  {} {}\n",
                "critic:".dimmed(),
                "unavailable".yellow()
            )),
        }

        if let Some(result) = &card.result {
            output.push_str(&format!("  {} {}\n", "result:".dimmed(), result));
        }
        output
    }

    /// Format the outcome of a confirmed action
    pub fn confirmation(result: &ToolInvocationResult) -> String {
        let head = if result.outcome.is_error {
            format!("{} {}", "Failed:".red().bold(), result.tool_name)
        } else {
            format!("{} {}", "Done:".green().bold(), result.tool_name)
        };
        if result.outcome.content.is_empty() {
            head
        } else {
            format!("{head}\n{}", Self::indent(&result.outcome.content, "  "))
        }
    }

    /// Format the merged catalog with per-server counts
    pub fn catalog(snapshot: &CatalogSnapshot) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {}\n",
            "Tools:".cyan().bold(),
            snapshot.len()
        ));
        for count in snapshot.per_server_counts() {
            output.push_str(&format!("  {:<20} {}\n", count.server.yellow(), count.count));
        }
        output.push('\n');
        for tool in snapshot.tools() {
            let description = tool.description.lines().next().unwrap_or_default();
            output.push_str(&format!(
                "  {} {}\n",
                tool.name.bold(),
                format!("({}) {}", tool.server, description).dimmed()
            ));
        }
        output
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{prefix}{line}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
