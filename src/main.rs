use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

mod banter;

use banter::config::Settings;
use banter::models::{Conversation, ConversationStore};
use banter::services::{HttpCompletionClient, MessageSendCoordinator};
use banter::storage::JsonFileStore;

#[derive(Parser, Debug)]
#[command(name = "banter", about = "Local-first chat client", version)]
struct Cli {
    /// Base URL of the completion backend
    #[arg(long)]
    backend_url: Option<String>,

    /// System prompt forwarded with every message
    #[arg(long)]
    system_prompt: Option<String>,

    /// Directory for the durable conversation store
    #[arg(long)]
    data_dir: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env();
    if let Some(url) = cli.backend_url {
        settings.backend_url = url;
    }
    if let Some(prompt) = cli.system_prompt {
        settings.system_prompt = Some(prompt);
    }
    if let Some(dir) = cli.data_dir {
        settings.data_dir = Some(dir);
    }

    info!(backend_url = %settings.backend_url, "Starting banter");

    let local_store = match &settings.data_dir {
        Some(dir) => JsonFileStore::with_dir(dir.clone()),
        None => JsonFileStore::new().context("Failed to initialize local store")?,
    };

    let mut store = ConversationStore::new(Arc::new(local_store));
    store.load();

    let client = HttpCompletionClient::new(
        &settings.backend_url,
        Duration::from_secs(settings.request_timeout_secs),
    );

    // Connectivity probe; the app still starts if the backend is down
    match client.health().await {
        Ok(health) => info!(
            status = %health.status,
            service = %health.service,
            version = %health.version,
            "Backend reachable"
        ),
        Err(e) => warn!(error = %e, "Backend health check failed"),
    }

    let mut coordinator =
        MessageSendCoordinator::new(Arc::new(client), settings.system_prompt.clone());

    // Open the most recent conversation, or start a fresh one
    let mut active_id = match store.conversations().first() {
        Some(conversation) => conversation.id.clone(),
        None => store.create_conversation(None).id,
    };

    println!("banter — type a message, or /help for commands");
    print_thread(store.get(&active_id));

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').map_or((line, ""), |(cmd, rest)| (cmd, rest.trim())) {
            ("/quit", _) | ("/exit", _) => break,
            ("/help", _) => print_help(),
            ("/new", rest) => {
                let initial = if rest.is_empty() { None } else { Some(rest) };
                let conversation = store.create_conversation(initial);
                active_id = conversation.id.clone();
                println!("Started \"{}\"", conversation.title);
            }
            ("/list", _) => {
                for (index, conversation) in store.conversations().iter().enumerate() {
                    let marker = if conversation.id == active_id { "*" } else { " " };
                    println!(
                        "{} [{}] {} ({} messages)",
                        marker,
                        index,
                        conversation.title,
                        conversation.messages.len()
                    );
                }
            }
            ("/open", rest) => match rest.parse::<usize>().ok().and_then(|i| store.conversations().get(i)) {
                Some(conversation) => {
                    active_id = conversation.id.clone();
                    println!("Opened \"{}\"", conversation.title);
                    print_thread(store.get(&active_id));
                }
                None => println!("No conversation at that index (see /list)"),
            },
            ("/title", rest) => match store.update_conversation_title(&active_id, rest) {
                Ok(()) => println!("Renamed"),
                Err(e) => println!("{}", e),
            },
            ("/delete", _) => {
                store.delete_conversation(&active_id);
                active_id = match store.conversations().first() {
                    Some(conversation) => conversation.id.clone(),
                    None => store.create_conversation(None).id,
                };
                println!("Deleted; now in \"{}\"", store.get(&active_id).map_or("?", |c| c.title.as_str()));
            }
            ("/clear", _) => {
                store.clear_history();
                active_id = store.create_conversation(None).id;
                println!("History cleared");
            }
            _ => {
                match coordinator.send(line, &active_id, &mut store).await {
                    Ok(()) => {
                        if let Some(reply) = store.get(&active_id).and_then(|c| c.messages.last()) {
                            println!("{}", reply.content);
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                }
                if let Some(e) = store.last_error() {
                    warn!(error = %e, "Conversation persistence is degraded");
                }
            }
        }
    }

    Ok(())
}

fn print_help() {
    println!("/new [first message]   start a conversation");
    println!("/list                  list conversations");
    println!("/open <index>          switch conversation");
    println!("/title <text>          rename the active conversation");
    println!("/delete                delete the active conversation");
    println!("/clear                 delete all conversations");
    println!("/quit                  exit");
}

fn print_thread(conversation: Option<&Conversation>) {
    let Some(conversation) = conversation else {
        return;
    };

    println!("— {} —", conversation.title);
    for message in &conversation.messages {
        let speaker = match message.role {
            banter::models::Role::User => "you",
            banter::models::Role::Assistant => "assistant",
        };
        println!("{}: {}", speaker, message.content);
    }
}
