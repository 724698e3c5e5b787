//! ghostwatch - who have you gone quiet on?
//!
//! Reads the chat snapshot and roster from the data directory and ranks
//! tracked people by how long it has been since you last talked.
//!
//! # Usage
//!
//! ```bash
//! # Most neglected people first
//! ghostwatch dashboard
//!
//! # Track someone and link their chats
//! ghostwatch add "Dana Kim"
//! ghostwatch candidates p_1742470000000_3f9a1c2b7d dana
//! ghostwatch link p_1742470000000_3f9a1c2b7d '!abc:beeper.local'
//!
//! # Stay running and notify when someone crosses 14 days
//! ghostwatch watch
//!
//! # Enable debug logging
//! RUST_LOG=ghostd=debug ghostwatch watch
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ghost_core::avatar::display_url;
use ghost_core::matching::LOG_SEARCH_LIMIT;
use ghost_core::{
    candidates, days_label, initials, owner_of, rank_people, search_log, ChatId, ChatRecord,
    DerivedPerson, DomainError, Person, PersonId, RosterStats,
};
use ghost_protocol::PeopleResponse;
use ghostd::watcher::RefreshRequest;
use ghostd::{spawn_watcher, Config, ContactsService, LocalService, LogNotifier, Watcher};

/// ghostwatch - keep track of who you are ghosting
#[derive(Parser, Debug)]
#[command(name = "ghostwatch", version, about)]
struct Args {
    /// Config file (defaults to $XDG_CONFIG_HOME/ghostwatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh periodically and notify on new overdue people
    Watch,
    /// Tracked people, most neglected first
    Dashboard {
        /// Only show people whose name contains this
        #[arg(short, long)]
        search: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Total, overdue and fresh counts
    Stats,
    /// Whether the chat snapshot is readable
    Status,
    /// Search every chat by name, handle or network
    Search { query: String },
    /// Start tracking a person
    Add { name: String },
    /// Stop tracking a person
    Remove { person_id: String },
    /// Change a person's display name
    Rename { person_id: String, name: String },
    /// Chats that can still be linked to a person
    Candidates {
        person_id: String,
        #[arg(default_value = "")]
        query: String,
    },
    /// Link a chat to a person
    Link { person_id: String, chat_id: String },
    /// Unlink a chat from a person
    Unlink { person_id: String, chat_id: String },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    run(config, args.command.unwrap_or(Command::Dashboard {
        search: None,
        json: false,
    }))
}

#[tokio::main]
async fn run(config: Config, command: Command) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("ghostwatch=info".parse()?)
                .add_directive("ghostd=info".parse()?)
                .add_directive("ghost_core=info".parse()?)
                .add_directive("ghost_protocol=info".parse()?),
        )
        .init();

    let service = LocalService::from_config(&config);

    match command {
        Command::Watch => watch(config, service).await,
        Command::Dashboard { search, json } => dashboard(&service, search.as_deref(), json).await,
        Command::Stats => stats(&service).await,
        Command::Status => status(&service).await,
        Command::Search { query } => search(&service, &query).await,
        Command::Add { name } => add(&service, name).await,
        Command::Remove { person_id } => remove(&service, &PersonId::new(person_id)).await,
        Command::Rename { person_id, name } => {
            rename(&service, &PersonId::new(person_id), &name).await
        }
        Command::Candidates { person_id, query } => {
            list_candidates(&service, &PersonId::new(person_id), &query).await
        }
        Command::Link { person_id, chat_id } => {
            link(&service, &PersonId::new(person_id), &ChatId::new(chat_id)).await
        }
        Command::Unlink { person_id, chat_id } => {
            unlink(&service, &PersonId::new(person_id), &ChatId::new(chat_id)).await
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn fetch_people(service: &LocalService) -> Result<Vec<DerivedPerson>> {
    match service.people(false).await? {
        PeopleResponse::People { people } => Ok(people),
        PeopleResponse::Error { error } => bail!("{error}"),
    }
}

async fn dashboard(service: &LocalService, search: Option<&str>, json: bool) -> Result<()> {
    let people = rank_people(&fetch_people(service).await?, DerivedPerson::clone, search);

    if json {
        println!("{}", serde_json::to_string_pretty(&people)?);
        return Ok(());
    }

    if people.is_empty() {
        println!("Nobody to show. Add someone with `ghostwatch add NAME`.");
        return Ok(());
    }

    for person in &people {
        let networks: Vec<&str> = person.networks.iter().map(|n| n.label()).collect();
        let avatar = person
            .avatar
            .as_deref()
            .and_then(display_url)
            .unwrap_or_else(|| initials(&person.display_name));
        println!(
            "{:<24} {:>10}  urgency {}  {}{}  [{}]  {}",
            person.display_name,
            days_label(person.days_since),
            person.urgency.level(),
            if person.waiting_on_you { "waiting on you  " } else { "" },
            networks.join(", "),
            person.id,
            avatar,
        );
        if !person.preview.is_empty() {
            println!("    {}", person.preview);
        }
    }
    Ok(())
}

async fn stats(service: &LocalService) -> Result<()> {
    let stats = RosterStats::from_people(&fetch_people(service).await?);
    println!(
        "{} tracked, {} overdue, {} fresh",
        stats.total, stats.overdue, stats.fresh
    );
    Ok(())
}

async fn status(service: &LocalService) -> Result<()> {
    let status = service.status().await;
    match status.error {
        None => println!("Connected"),
        Some(reason) => println!("Disconnected: {reason}"),
    }
    Ok(())
}

fn print_chat(chat: &ChatRecord) {
    let kind = if chat.is_group {
        format!("group of {}", chat.member_count)
    } else {
        chat.handle_or_empty().to_string()
    };
    println!(
        "{:<40} {:<24} {:<16} {:>10}  {}",
        chat.id.as_str(),
        chat.name_or_empty(),
        chat.network.label(),
        chat.days_label(),
        kind
    );
}

async fn search(service: &LocalService, query: &str) -> Result<()> {
    let pool = service.contacts_raw().await?.into_pool();
    for chat in search_log(pool.iter(), query, LOG_SEARCH_LIMIT) {
        print_chat(chat);
    }
    Ok(())
}

async fn add(service: &LocalService, name: String) -> Result<()> {
    let mut settings = service.settings().await?;
    let person = Person::new(name);
    let id = person.id.clone();
    settings.save_person(&person)?;
    service.save_settings(settings).await?;
    println!("{id}");
    Ok(())
}

async fn remove(service: &LocalService, id: &PersonId) -> Result<()> {
    let mut settings = service.settings().await?;
    if settings.remove_person(id) {
        service.save_settings(settings).await?;
    } else {
        println!("No person {id}");
    }
    Ok(())
}

async fn rename(service: &LocalService, id: &PersonId, name: &str) -> Result<()> {
    let mut settings = service.settings().await?;
    settings.rename_person(id, name)?;
    service.save_settings(settings).await?;
    Ok(())
}

async fn list_candidates(service: &LocalService, id: &PersonId, query: &str) -> Result<()> {
    let settings = service.settings().await?;
    let target = settings
        .person(id)
        .with_context(|| format!("No person {id}"))?;
    let pool = service.contacts_raw().await?.into_pool();

    let offered = candidates(&pool, &settings.people, target, query);
    if offered.is_empty() {
        println!("No contacts found");
    }
    for chat in offered {
        print_chat(chat);
    }
    Ok(())
}

async fn link(service: &LocalService, id: &PersonId, chat_id: &ChatId) -> Result<()> {
    let pool = service.contacts_raw().await?.into_pool();
    let mut settings = service.settings().await?;
    match settings.link_chat(&pool, id, chat_id) {
        Ok(true) => {
            service.save_settings(settings).await?;
            println!("Linked {chat_id} to {id}");
        }
        Ok(false) => println!("{chat_id} is already linked to {id}"),
        Err(err @ DomainError::ChatNotOffered { .. }) => {
            match owner_of(&settings.people, chat_id) {
                Some(owner) => bail!("{chat_id} already belongs to {}", owner.display_name),
                None => return Err(err.into()),
            }
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

async fn unlink(service: &LocalService, id: &PersonId, chat_id: &ChatId) -> Result<()> {
    let mut settings = service.settings().await?;
    if settings.unlink_chat(id, chat_id)? {
        service.save_settings(settings).await?;
        println!("Unlinked {chat_id} from {id}");
    } else {
        println!("{chat_id} was not linked to {id}");
    }
    Ok(())
}

/// Runs the watcher until Ctrl-C. Each line on stdin requests a refresh.
async fn watch(config: Config, service: LocalService) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "ghostwatch starting"
    );

    let watcher = Watcher::new(
        Arc::new(service),
        Arc::new(LogNotifier),
        config.overdue_threshold_days,
        config.refresh_interval(),
    );
    let cancel_token = CancellationToken::new();
    let (refresh_tx, handle) = spawn_watcher(watcher, cancel_token.clone());

    let stdin_token = cancel_token.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = stdin_token.cancelled() => break,
                line = lines.next_line() => match line {
                    Ok(Some(_)) => {
                        if refresh_tx.send(RefreshRequest).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, "Failed to read stdin");
                        break;
                    }
                },
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutdown signal received");
    cancel_token.cancel();

    handle.await.context("Watcher task failed")?;
    info!("ghostwatch stopped");
    Ok(())
}
