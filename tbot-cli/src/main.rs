//! tbot CLI: run the long-poll engine with a pair of demo handlers (echo and
//! /start greeting). Config from env and optional CLI args.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;

use tbot_api::{Api, SendOptions};
use tbot_core::{init_tracing, BotConfig, DispatchContext};
use tbot_engine::{BotEngine, EventDetails, EventHandler, PollSettings};

#[derive(Parser)]
#[command(name = "tbot")]
#[command(about = "Long-poll bot runner", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
}

/// Echoes plain text messages back to their chat.
struct EchoHandler {
    api: Arc<Api>,
}

#[async_trait::async_trait]
impl EventHandler for EchoHandler {
    async fn handle(
        &self,
        data: Value,
        _details: EventDetails,
        _me: Option<DispatchContext>,
    ) -> tbot_core::Result<Value> {
        let chat_id = data
            .get("chat")
            .and_then(|chat| chat.get("id"))
            .and_then(Value::as_i64);
        let text = data.get("text").and_then(Value::as_str);
        if let (Some(chat_id), Some(text)) = (chat_id, text) {
            if !text.starts_with('/') {
                self.api
                    .send_message(chat_id, text, &SendOptions::default())
                    .await?;
            }
        }
        Ok(Value::Null)
    }
}

/// Greets on /start.
struct StartHandler {
    api: Arc<Api>,
}

#[async_trait::async_trait]
impl EventHandler for StartHandler {
    async fn handle(
        &self,
        data: Value,
        _details: EventDetails,
        _me: Option<DispatchContext>,
    ) -> tbot_core::Result<Value> {
        let chat_id = data
            .get("chat")
            .and_then(|chat| chat.get("id"))
            .and_then(Value::as_i64);
        if let Some(chat_id) = chat_id {
            self.api
                .send_message(chat_id, "Hello! Say anything and I will echo it.", &SendOptions::default())
                .await?;
        }
        Ok(Value::Null)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { token } => run(token).await,
    }
}

async fn run(token: Option<String>) -> Result<()> {
    let config = BotConfig::load(token)?;
    config.validate()?;
    init_tracing(config.log_file.as_deref())?;

    let api = Arc::new(Api::from_config(&config));
    let engine = BotEngine::new(PollSettings::from(&config), api.clone());

    engine
        .on(&["/start"], Arc::new(StartHandler { api: api.clone() }))
        .await;
    engine
        .on(&["text"], Arc::new(EchoHandler { api: api.clone() }))
        .await;

    let handle = engine.start().await;
    info!("polling; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    engine.stop(Some("interrupted")).await;
    handle.await?;

    Ok(())
}
