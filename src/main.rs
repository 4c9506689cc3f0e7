use anyhow::{Context, Result};
use recipe_chat::api_connection::ChatApiClient;
use recipe_chat::cli::{parse_args, parse_chat_input, ChatInput, Command, CHAT_HELP};
use recipe_chat::config::Config;
use recipe_chat::local_cache::LocalCache;
use recipe_chat::message_exchange::{MessageExchange, SendOutcome};
use recipe_chat::session_manager::SessionManager;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "warn,recipe_chat=info";

type Chat = MessageExchange<ChatApiClient>;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn print_sessions(chat: &Chat) {
    let manager = chat.manager();
    if manager.sessions().is_empty() {
        println!("No sessions yet.");
        return;
    }
    for session in manager.sessions() {
        let marker = if manager.active_session_id() == Some(session.id.as_str()) { "*" } else { " " };
        println!(
            "{} {}  {}  ({} messages, {})",
            marker,
            session.id,
            session.name,
            session.messages.len(),
            session.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_messages(chat: &Chat) {
    if chat.state().messages.is_empty() {
        println!("(empty session)");
    }
    for message in &chat.state().messages {
        print!("{}", message);
    }
}

fn print_outcome(chat: &Chat, outcome: &SendOutcome) {
    match outcome {
        SendOutcome::Completed { .. } => {
            if let Some(reply) = chat.state().messages.last() {
                print!("{}", reply);
            }
        }
        SendOutcome::Failed(message) => eprintln!("Error: {}", message),
        SendOutcome::Busy => eprintln!("Still waiting for the previous request."),
        SendOutcome::Superseded { session_id } => {
            println!("Recipes arrived for session {}.", session_id)
        }
        SendOutcome::Ignored | SendOutcome::SessionCreated(_) => {}
    }
}

/// Sends once, re-submitting a single time if a session had to be created first.
async fn send(chat: &mut Chat, ingredients: &str) -> SendOutcome {
    match chat.send_message(ingredients).await {
        SendOutcome::SessionCreated(session_id) => {
            println!("Started session {}", session_id);
            chat.send_message(ingredients).await
        }
        outcome => outcome,
    }
}

async fn run_chat(chat: &mut Chat, session: Option<String>) -> Result<()> {
    chat.manager_mut().sync_sessions().await;
    if let Some(session_id) = session {
        chat.manager_mut().load_session(&session_id).await;
        print_messages(chat);
    }
    println!("{}", CHAT_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        match parse_chat_input(&line) {
            ChatInput::Ingredients(ingredients) => {
                let outcome = send(chat, &ingredients).await;
                print_outcome(chat, &outcome);
            }
            ChatInput::New => {
                let session = chat.manager_mut().create_session().await;
                println!("Started session {}", session.id);
            }
            ChatInput::List => print_sessions(chat),
            ChatInput::Switch(session_id) => {
                if chat.manager().session(&session_id).is_none() {
                    eprintln!("No session {}", session_id);
                    continue;
                }
                chat.manager_mut().load_session(&session_id).await;
                print_messages(chat);
            }
            ChatInput::Rename(name) => {
                let Some(active) = chat.manager().active_session_id().map(str::to_string) else {
                    eprintln!("No active session.");
                    continue;
                };
                if let Err(e) = chat.manager_mut().rename_session(&active, &name).await {
                    eprintln!("{}", e);
                }
            }
            ChatInput::Delete(target) => {
                let target = target.or_else(|| chat.manager().active_session_id().map(str::to_string));
                match target {
                    Some(session_id) => chat.manager_mut().delete_session(&session_id).await,
                    None => eprintln!("No active session."),
                }
            }
            ChatInput::History => print_messages(chat),
            ChatInput::Help => println!("{}", CHAT_HELP),
            ChatInput::Quit => break,
            ChatInput::Unknown(input) => eprintln!("Unknown command: {} (try /help)", input),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let cli_args = parse_args();
    let mut config = Config::from_env();
    if let Some(api_url) = cli_args.api_url {
        config.api_url = api_url;
    }
    if let Some(cache_dir) = cli_args.cache_dir {
        config.cache_dir = cache_dir;
    }

    let client = ChatApiClient::new(&config.api_url, config.request_timeout)
        .with_context(|| format!("Failed to set up client for '{}'", config.api_url))?;
    let cache = LocalCache::new(&config.cache_dir);
    let mut chat = MessageExchange::new(SessionManager::restore(client, cache).await);

    match cli_args.command.unwrap_or(Command::Chat { session: None }) {
        Command::Chat { session } => run_chat(&mut chat, session).await?,
        Command::Sessions => {
            chat.manager_mut().sync_sessions().await;
            print_sessions(&chat);
        }
        Command::Send { ingredients, session } => {
            match session {
                Some(session_id) => {
                    chat.manager_mut().load_session(&session_id).await;
                }
                None => {
                    chat.manager_mut().resume_latest().await;
                }
            }
            let outcome = send(&mut chat, &ingredients).await;
            print_outcome(&chat, &outcome);
            if let SendOutcome::Failed(message) = outcome {
                return Err(anyhow::anyhow!("Recipe generation failed: {}", message));
            }
        }
        Command::History { session } => {
            chat.manager_mut().load_session(&session).await;
            print_messages(&chat);
        }
        Command::Rename { session, name } => {
            chat.manager_mut()
                .rename_session(&session, &name)
                .await
                .context("Rename rejected")?;
        }
        Command::Delete { session } => chat.manager_mut().delete_session(&session).await,
        Command::Health => {
            let status = chat
                .manager()
                .remote()
                .health()
                .await
                .with_context(|| format!("Backend at '{}' is not reachable", config.api_url))?;
            println!(
                "{} (version {})",
                status.status,
                status.version.as_deref().unwrap_or("unknown")
            );
        }
    }

    Ok(())
}
