use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use glass_mind::{
    clients::{ModelClient, OpenAIClient},
    config::Config,
    server::{AppState, start_http_server},
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "glass-mind", about = "Reasoning-transparency front end for a hosted LLM")]
struct Cli {
    /// Path to the TOML config file (defaults to GLASS_MIND_CONFIG or glass_mind.toml)
    #[arg(long)]
    config: Option<String>,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<SocketAddr>,
}

fn build_client(config: &Config) -> Result<Arc<dyn ModelClient>> {
    match config.model.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIClient::new(
            config.runtime.openai_api_key.clone(),
            config.model.base_url.clone(),
            config.runtime.request_timeout_ms,
        )?)),
        other => anyhow::bail!("Unsupported model provider '{}'", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from(cli.config.as_deref()).map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(bind) = cli.bind {
        config.runtime.http_bind = bind;
    }

    tracing_subscriber::fmt()
        .with_env_filter(config.runtime.log_level.as_str())
        .init();

    info!(
        "Starting glass-mind (provider={}, model={}, labels={})",
        config.model.provider, config.model.model, config.label.enabled
    );

    let client = build_client(&config)?;
    let state = AppState::new(config, client);

    start_http_server(state).await?;

    Ok(())
}
