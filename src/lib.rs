pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod relay;
pub mod server;
pub mod widget;

use cli::{ Args, ChatArgs, Command, ServeArgs };
use config::RelayConfig;
use llm::chat::OpenAIChatClient;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.command {
        Command::Serve(serve) => serve_relay(serve).await,
        Command::Chat(chat) => chat_in_terminal(chat).await,
    }
}

async fn serve_relay(args: ServeArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = RelayConfig::from_args(&args)?;

    info!("--- Relay Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Upstream URL: {}", config.api_url);
    info!("Model: {}", config.model);
    info!("API Key Set: {}", config.api_key.is_some());
    info!("Default Provider Headers: {}", config.is_default_provider());
    if let Some(site_url) = &config.site_url {
        info!("Site URL: {}", site_url);
    }
    if let Some(site_name) = &config.site_name {
        info!("Site Name: {}", site_name);
    }
    info!("TLS Enabled: {}", args.enable_tls);
    info!("---------------------------");

    let transport = Arc::new(OpenAIChatClient::new()?);
    let server = Server::new(args, config, transport);
    server.run().await
}

async fn chat_in_terminal(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    widget::terminal::run_terminal_chat(args).await
}
