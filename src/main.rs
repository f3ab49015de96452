//! thornbot - chat bot command engine
//!
//! Turns incoming chat lines into typed rich-text messages, dispatches
//! them against the command registry, and post-processes responses with
//! runtime variable injection.

mod commands;
mod config;
mod dispatch;
mod error;
mod inject;

use crate::commands::Registry;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use std::io::IsTerminal;
use thorn_proto::Message;
use tokio::io::AsyncBufReadExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        username = %config.bot.username,
        channel = %config.bot.channel,
        prefix = %config.bot.prefix,
        "Starting thornbot"
    );

    let dispatcher = Dispatcher::new(
        &config.bot.username,
        &config.bot.channel,
        config.bot.prefix,
        Registry::new(),
    );

    // Console loop standing in for the network transport: each stdin
    // line is a chat message from a local user.
    if std::io::stdin().is_terminal() {
        info!("Reading chat lines from stdin; Ctrl-D to quit");
    }
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let message = Message::from_text(line).with_user("console");
        if let Some(reply) = dispatcher.dispatch(&message).await {
            println!("{}", reply.text());
        }
    }

    Ok(())
}
