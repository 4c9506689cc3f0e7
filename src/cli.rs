use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{API_URL_ENV_VAR, CACHE_DIR_ENV_VAR};

#[derive(Parser, Debug)]
#[command(author, version, about = "Suggest recipes from the ingredients you have", long_about = None)]
pub struct Cli {
    /// Base URL of the recipe backend
    #[arg(long, global = true, env = API_URL_ENV_VAR)]
    pub api_url: Option<String>,

    /// Directory holding the local session cache
    #[arg(long, global = true, env = CACHE_DIR_ENV_VAR)]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat (default)
    Chat {
        /// Session to resume
        #[arg(short, long)]
        session: Option<String>,
    },
    /// List sessions
    Sessions,
    /// Send one ingredient list and print the suggested recipes
    Send {
        ingredients: String,
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Show the messages of a session
    History { session: String },
    Rename { session: String, name: String },
    Delete { session: String },
    /// Check that the backend is up
    Health,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

/// A line typed into the interactive chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Ingredients(String),
    New,
    List,
    Switch(String),
    Rename(String),
    Delete(Option<String>),
    History,
    Help,
    Quit,
    Unknown(String),
}

pub const CHAT_HELP: &str = "\
Type your ingredients (e.g. eggs, flour, milk) to get recipe ideas.
  /new              start a new session
  /list             list sessions
  /switch <id>      switch to a session
  /rename <name>    rename the current session
  /delete [id]      delete a session (default: current)
  /history          show the current session
  /quit             leave";

pub fn parse_chat_input(line: &str) -> ChatInput {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return ChatInput::Ingredients(line.to_string());
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match name {
        "new" => ChatInput::New,
        "list" => ChatInput::List,
        "switch" if !arg.is_empty() => ChatInput::Switch(arg.to_string()),
        "rename" => ChatInput::Rename(arg.to_string()),
        "delete" => ChatInput::Delete((!arg.is_empty()).then(|| arg.to_string())),
        "history" => ChatInput::History,
        "help" => ChatInput::Help,
        "quit" | "exit" => ChatInput::Quit,
        _ => ChatInput::Unknown(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_ingredients() {
        assert_eq!(
            parse_chat_input("  eggs, flour, milk "),
            ChatInput::Ingredients("eggs, flour, milk".to_string())
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse_chat_input("/new"), ChatInput::New);
        assert_eq!(parse_chat_input("/switch abc"), ChatInput::Switch("abc".to_string()));
        assert_eq!(
            parse_chat_input("/rename  Sunday brunch "),
            ChatInput::Rename("Sunday brunch".to_string())
        );
        assert_eq!(parse_chat_input("/delete"), ChatInput::Delete(None));
        assert_eq!(parse_chat_input("/exit"), ChatInput::Quit);
        assert_eq!(parse_chat_input("/switch"), ChatInput::Unknown("/switch".to_string()));
    }

    #[test]
    fn test_cli_parses_send() {
        let cli = Cli::try_parse_from(["recipe_chat", "send", "eggs, rice", "--session", "s1"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Send {
                ingredients: "eggs, rice".to_string(),
                session: Some("s1".to_string()),
            })
        );
    }
}
