#![deny(dead_code)]
use anyhow::Result;
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

mod credentials;
mod utils;

use crate::credentials::{load_credentials, save_credentials, Credentials};
use huddle::chat::{Alert, ChatClient, HttpGateway, LiveConnection, Notifier};
use huddle::models::{ContactStatus, MessageDraft};
use huddle::prefs;

/// Command line arguments for Huddle
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Huddle: a terminal client for the Huddle chat backend.",
    long_about = "Huddle synchronizes one-to-one conversations with a chat backend:\n\
    optimistic sends, live message events, and debounced notifications.\n\n\
    Credentials resolve from HUDDLE_SERVER / HUDDLE_EMAIL / HUDDLE_USER_ID /\n\
    HUDDLE_TOKEN, then the cached credentials file, then an interactive prompt."
)]
struct Args {
    /// Write logs to this file (defaults to huddle.log in the working directory)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// Prompts the user for connection details or uses environment variables
fn prompt_credentials() -> (String, String, String, String) {
    let server = env::var("HUDDLE_SERVER").unwrap_or_else(|_| {
        eprintln!("Enter backend base URL (e.g., https://chat.example.com):");
        utils::read_line().unwrap_or_default()
    });

    let email = env::var("HUDDLE_EMAIL").unwrap_or_else(|_| {
        eprintln!("Enter account email:");
        utils::read_line().unwrap_or_default()
    });

    let user_id = env::var("HUDDLE_USER_ID").unwrap_or_else(|_| {
        eprintln!("Enter account user id:");
        utils::read_line().unwrap_or_default()
    });

    let token = env::var("HUDDLE_TOKEN").unwrap_or_else(|_| {
        eprintln!("Enter API token (input will not be hidden):");
        utils::read_line().unwrap_or_default()
    });

    (server, email, user_id, token)
}

/// Derive the live event stream URL from the backend base URL.
fn ws_url(base: &str, token: &str) -> String {
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        format!("ws://{}", base)
    };
    format!("{}/ws?token={}", ws_base.trim_end_matches('/'), token)
}

fn print_messages(client: &ChatClient) {
    let messages = client.messages();
    if messages.is_empty() {
        println!("(no messages)");
        return;
    }
    for msg in messages {
        let marker = if msg.is_optimistic { "*" } else { " " };
        let who = if msg.sender_id == client.user_id() {
            "me"
        } else {
            "them"
        };
        println!(
            "{} [{}] {}: {}",
            marker,
            msg.created_at.format("%H:%M:%S"),
            who,
            msg.preview()
        );
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /contacts            list addressable contacts");
    println!("  /chats               list conversations, most recent first");
    println!("  /select <email>      open the conversation with a contact");
    println!("  /history             re-fetch the open conversation");
    println!("  /sound               toggle the notification sound");
    println!("  /quit                exit");
    println!("Anything else is sent as a message to the selected contact.");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_file_path = args
        .log_file
        .unwrap_or_else(|| PathBuf::from("huddle.log"));
    utils::setup_logging(log_file_path.to_str(), LevelFilter::Debug)?;

    info!("Huddle chat client starting up");
    info!(
        "System information: {} {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );

    // Get credentials: prefer environment variables, then file, then prompt
    let (server, email, user_id, token, credentials_from_env) = if let (
        Ok(server),
        Ok(email),
        Ok(user_id),
        Ok(token),
    ) = (
        env::var("HUDDLE_SERVER"),
        env::var("HUDDLE_EMAIL"),
        env::var("HUDDLE_USER_ID"),
        env::var("HUDDLE_TOKEN"),
    ) {
        (server, email, user_id, token, true)
    } else if let Some(creds) = load_credentials()? {
        info!("Using cached credentials for {}", creds.email);
        if let Some(token) = creds.get_token() {
            (creds.server, creds.email, creds.user_id, token, false)
        } else {
            eprintln!("Enter API token for {}:", creds.email);
            let token = utils::read_line().unwrap_or_default();
            (creds.server, creds.email, creds.user_id, token, false)
        }
    } else {
        let (server, email, user_id, token) = prompt_credentials();
        (server, email, user_id, token, false)
    };

    println!("Connecting to {}...", server);

    let gateway = Arc::new(HttpGateway::new(&server, &token)?);

    // A dead live connection degrades to fetch-only operation.
    let live = match LiveConnection::connect(&ws_url(&server, &token)).await {
        Ok(live) => live,
        Err(e) => {
            warn!("Live events unavailable, continuing without push: {}", e);
            LiveConnection::offline()
        }
    };

    let preferences = prefs::load_preferences().unwrap_or_else(|e| {
        warn!("Failed to load preferences, using defaults: {}", e);
        prefs::Preferences::default()
    });
    let (notifier, mut alerts) = Notifier::new(preferences.sound_enabled);
    // A terminal surface has no window focus signal; treat it as away so
    // notifications always fire.
    notifier.set_window_focused(false);

    let client = Arc::new(ChatClient::new(&user_id, gateway, live, notifier.clone()));

    // Surface alerts on the terminal as they arrive.
    tokio::spawn(async move {
        while let Some(alert) = alerts.recv().await {
            match alert {
                Alert::Notify { title, body, .. } => println!("\n[{}] {}", title, body),
                Alert::Sound => print!("\x07"),
            }
        }
    });

    match client.load_contacts().await {
        Ok(contacts) => {
            if !credentials_from_env {
                // First successful round-trip; cache what we connected with.
                let creds = Credentials::new(&server, &email, &user_id, &token);
                if let Err(e) = save_credentials(&creds) {
                    eprintln!("Warning: Failed to save credentials: {}", e);
                }
            }
            println!("Connected as {} ({} contacts)", email, contacts.len());
        }
        Err(e) => {
            error!("Could not load contacts: {}", e);
            eprintln!("Could not reach the backend: {}", e);
        }
    }
    print_help();

    loop {
        let line = tokio::task::spawn_blocking(utils::read_line).await??;
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("/select ") {
            let email = rest.trim();
            match client.find_contact_by_email(email) {
                Some(contact) => {
                    let status = match client.contact_status(&contact.id) {
                        ContactStatus::Online => "online",
                        ContactStatus::Offline => "offline",
                    };
                    println!("-- {} ({}) --", contact.display_label(), status);
                    client.select_contact(contact).await;
                    print_messages(&client);
                }
                None => println!("No contact with email {}", email),
            }
            continue;
        }

        match line.as_str() {
            "/quit" => {
                client.unsubscribe_live();
                break;
            }
            "/help" => print_help(),
            "/contacts" => match client.load_contacts().await {
                Ok(contacts) => {
                    for contact in contacts {
                        println!("  {} <{}>", contact.display_label(), contact.email);
                    }
                }
                Err(e) => println!("Failed to load contacts: {}", e),
            },
            "/chats" => match client.load_chats().await {
                Ok(chats) => {
                    for chat in chats {
                        let who = chat
                            .counterparty(client.user_id())
                            .map(|c| c.display_label().to_string())
                            .unwrap_or_else(|| "(unknown)".to_string());
                        let preview = chat
                            .last_message
                            .as_ref()
                            .map(|m| m.preview().to_string())
                            .unwrap_or_default();
                        println!("  {} | {}", who, preview);
                    }
                }
                Err(e) => println!("Failed to load chats: {}", e),
            },
            "/history" => {
                client.refresh_history().await;
                print_messages(&client);
            }
            "/sound" => {
                let enabled = !client.notifier().sound_enabled();
                client.notifier().set_sound_enabled(enabled);
                if let Err(e) = prefs::save_preferences(&prefs::Preferences {
                    sound_enabled: enabled,
                }) {
                    warn!("Failed to persist sound preference: {}", e);
                }
                println!("Sound {}", if enabled { "on" } else { "off" });
            }
            text => {
                if client.selected_contact().is_none() {
                    println!("Select a contact first: /select <email>");
                    continue;
                }
                client.send_message(MessageDraft::text(text)).await;
                print_messages(&client);
            }
        }
    }

    info!("Huddle chat client shutting down");
    Ok(())
}
