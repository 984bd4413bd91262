//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::render::ConsoleFormatter;
use crate::wiring::Pipeline;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vaultpilot_application::RunTurnInput;
use vaultpilot_domain::{ReflectionKey, StreamEvent, ThreadId};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Message(String),
    Confirm(String),
    Cancel(String),
    Pending,
    Tools,
    New,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ChatCommand::Empty;
        }
        if !line.starts_with('/') {
            return ChatCommand::Message(line.to_string());
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        match (name, rest) {
            ("/quit" | "/exit" | "/q", _) => ChatCommand::Quit,
            ("/help" | "/h" | "/?", _) => ChatCommand::Help,
            ("/confirm" | "/yes", key) if !key.is_empty() => ChatCommand::Confirm(key.to_string()),
            ("/cancel" | "/no", key) if !key.is_empty() => ChatCommand::Cancel(key.to_string()),
            ("/pending", _) => ChatCommand::Pending,
            ("/tools", _) => ChatCommand::Tools,
            ("/new", _) => ChatCommand::New,
            _ => ChatCommand::Unknown(line.to_string()),
        }
    }
}

/// Interactive chat REPL
pub struct ChatRepl<'a> {
    pipeline: &'a Pipeline,
    conversation_id: String,
}

impl<'a> ChatRepl<'a> {
    pub fn new(pipeline: &'a Pipeline, conversation_id: Option<String>) -> Self {
        Self {
            pipeline,
            conversation_id: conversation_id.unwrap_or_else(|| ThreadId::generate().to_string()),
        }
    }

    /// Run the interactive REPL until /quit or end of input
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        self.print_welcome();

        loop {
            print!(">>> ");
            std::io::stdout().flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    println!("^C");
                    continue;
                }
            };
            let Some(line) = line else {
                println!("Bye!");
                break;
            };

            match ChatCommand::parse(&line) {
                ChatCommand::Empty => {}
                ChatCommand::Quit => {
                    println!("Bye!");
                    break;
                }
                ChatCommand::Help => self.print_help(),
                ChatCommand::Message(message) => self.process_message(&message).await?,
                ChatCommand::Confirm(key) => self.confirm(&key).await,
                ChatCommand::Cancel(key) => self.cancel(&key),
                ChatCommand::Pending => self.print_pending(),
                ChatCommand::Tools => self.print_tools().await,
                ChatCommand::New => {
                    self.conversation_id = ThreadId::generate().to_string();
                    println!("New conversation: {}", self.conversation_id);
                }
                ChatCommand::Unknown(cmd) => {
                    println!("Unknown command: {cmd}");
                    println!("Type /help for available commands");
                }
            }
        }

        Ok(())
    }

    /// Stream one turn to the terminal. Ctrl-C cancels the turn.
    async fn process_message(&self, message: &str) -> std::io::Result<()> {
        let cancel = CancellationToken::new();
        let input = RunTurnInput::new(&self.conversation_id, message);
        let mut stream = self.pipeline.orchestrator.run_turn(input, cancel.clone());
        let mut interrupted = false;

        loop {
            let event = tokio::select! {
                event = stream.next() => event,
                _ = tokio::signal::ctrl_c(), if !interrupted => {
                    interrupted = true;
                    cancel.cancel();
                    continue;
                }
            };
            let Some(event) = event else { break };
            debug!(kind = event.kind(), "Turn event");

            if let Some(text) = ConsoleFormatter::event(&event) {
                match event {
                    StreamEvent::Text(_) => print!("{text}"),
                    _ => println!("{text}"),
                }
                std::io::stdout().flush()?;
            }
            if event.is_terminal() {
                break;
            }
        }
        println!();
        Ok(())
    }

    async fn confirm(&self, raw: &str) {
        let key = match ReflectionKey::parse(raw) {
            Ok(key) => key,
            Err(e) => {
                println!("{e}");
                return;
            }
        };
        // Ctrl-C asks the tool to stop; the card still resolves before we return.
        let cancel = CancellationToken::new();
        let confirm = self.pipeline.orchestrator.confirm(&key, &cancel);
        tokio::pin!(confirm);
        let mut interrupted = false;
        let result = loop {
            tokio::select! {
                result = &mut confirm => break result,
                _ = tokio::signal::ctrl_c(), if !interrupted => {
                    interrupted = true;
                    cancel.cancel();
                    println!("^C (waiting for the action to stop)");
                }
            }
        };
        match result {
            Ok(result) => println!("{}", ConsoleFormatter::confirmation(&result)),
            Err(e) => println!("{e}"),
        }
    }

    fn cancel(&self, raw: &str) {
        let outcome = ReflectionKey::parse(raw)
            .map_err(|e| e.to_string())
            .and_then(|key| {
                self.pipeline
                    .orchestrator
                    .cancel_action(&key)
                    .map_err(|e| e.to_string())
            });
        match outcome {
            Ok(card) => println!("{}", ConsoleFormatter::card(&card)),
            Err(message) => println!("{message}"),
        }
    }

    fn print_pending(&self) {
        let gate = self.pipeline.orchestrator.gate();
        let cards: Vec<_> = gate
            .pending_keys()
            .iter()
            .filter_map(|key| gate.card(key))
            .collect();
        if cards.is_empty() {
            println!("No pending actions");
        }
        for card in cards {
            println!("{}", ConsoleFormatter::card(&card));
        }
    }

    async fn print_tools(&self) {
        match self
            .pipeline
            .catalog
            .get_tools(&CancellationToken::new())
            .await
        {
            Ok(snapshot) => print!("{}", ConsoleFormatter::catalog(&snapshot)),
            Err(e) => println!("{e}"),
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│              vaultpilot - Chat              │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Conversation: {}", self.conversation_id);
        println!("Destructive actions wait for /confirm <key>.");
        println!("Type /help for commands, Ctrl-C cancels a running turn.");
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("Commands:");
        println!("  /help, /h, /?        - Show this help");
        println!("  /confirm <key>       - Run a pending action");
        println!("  /cancel <key>        - Discard a pending action");
        println!("  /pending             - List pending actions");
        println!("  /tools               - Show the tool catalog");
        println!("  /new                 - Start a new conversation");
        println!("  /quit, /exit, /q     - Exit chat");
        println!();
    }
}
