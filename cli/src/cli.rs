//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for vaultpilot
#[derive(Parser, Debug)]
#[command(name = "vaultpilot")]
#[command(author, version, about = "Chat with your notes vault; destructive tool calls wait for confirmation")]
#[command(long_about = r#"
vaultpilot drives a chat model over the tools advertised by your tool
servers. Any destructive call (delete, move, overwrite...) is reviewed by a
critic model and shown as an action card; nothing runs until you confirm it.

Configuration files are loaded from (in priority order):
1. VAULTPILOT_* environment variables (e.g. VAULTPILOT_AGENT__MODEL)
2. --config <path>                      Explicit config file
3. ./vaultpilot.toml                    Project-level config
4. ~/.config/vaultpilot/config.toml     Global config

Example:
  vaultpilot chat
  vaultpilot tools
  vaultpilot resolve "💡 project ideas"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat (default)
    Chat {
        /// Resume a conversation by id
        #[arg(long, value_name = "ID")]
        conversation: Option<String>,
    },
    /// Print the merged tool catalog with per-server counts
    Tools,
    /// Resolve a loosely written note name to its vault path
    Resolve {
        /// Note name, e.g. "daily note" or "💡 Project Ideas"
        candidate: String,
    },
    /// Show configuration sources and validation issues
    Config,
}

impl Cli {
    /// The subcommand to run; bare `vaultpilot` starts a chat.
    pub fn resolved_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Chat { conversation: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_chat() {
        let cli = Cli::parse_from(["vaultpilot"]);
        assert_eq!(cli.resolved_command(), Command::Chat { conversation: None });
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["vaultpilot", "resolve", "daily note", "-vv", "--no-config"]);
        assert_eq!(
            cli.resolved_command(),
            Command::Resolve {
                candidate: "daily note".to_string()
            }
        );
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_config);
    }

    #[test]
    fn test_chat_with_conversation() {
        let cli = Cli::parse_from(["vaultpilot", "chat", "--conversation", "conv-7"]);
        assert_eq!(
            cli.resolved_command(),
            Command::Chat {
                conversation: Some("conv-7".to_string())
            }
        );
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
