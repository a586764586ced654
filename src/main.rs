use anyhow::Result;
use clap::Parser;
use shortener::config::Config;
use shortener::server::Server;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// URL shortening service with per-client quotas
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Address to listen on (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Redis connection URL (overrides REDIS_URL)
    #[arg(long, conflicts_with = "memory")]
    redis_url: Option<String>,

    /// Keep links and quotas in process instead of Redis
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration from environment
    let mut config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(redis_url) = cli.redis_url {
        config.redis_url = redis_url;
    }
    if cli.memory {
        config.redis_url.clear();
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("shortener={},tower_http=debug", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting shortener service");
    tracing::info!(
        "Configuration: bind_addr={}, domain={}, api_quota={}, store={}",
        config.bind_addr,
        config.domain,
        config.api_quota,
        if config.uses_memory_store() { "memory" } else { "redis" }
    );

    // Create and run the server
    let server = Server::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to create server: {}", e))?;

    server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
