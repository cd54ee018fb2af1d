//! usher - control plane for room-based media sessions
//!
//! Issues join tokens, exposes room rosters, and manages per-room side
//! state on top of an external media session provider.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use usher::api::{build_app, AppState};
use usher::cache::{CacheStore, MemoryStore, RedisStore, RoomCache};
use usher::config::{CacheBackend, ProviderBackend, UsherConfig};
use usher::provider::memory::MemorySessionProvider;
use usher::provider::openvidu::OpenViduProvider;
use usher::provider::SessionProvider;
use usher::rooms::RoomGateway;
use usher::webhook::WebhookState;

#[derive(Parser)]
#[command(name = "usher")]
#[command(version)]
#[command(about = "Control plane for room-based media sessions")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "USHER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve {
        /// Host to bind to, overrides the configuration file
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overrides the configuration file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("usher={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        UsherConfig::from_file(config_path)?
    } else {
        UsherConfig::default()
    };
    config.apply_env();

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            serve(config).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn serve(config: UsherConfig) -> Result<()> {
    tracing::info!("Starting usher");

    let provider: Arc<dyn SessionProvider> = match config.provider.backend {
        ProviderBackend::Openvidu => Arc::new(OpenViduProvider::new(config.provider.clone())?),
        ProviderBackend::Memory => Arc::new(MemorySessionProvider::new()),
    };
    tracing::info!("Using '{}' session provider", provider.name());

    let store: Arc<dyn CacheStore> = match config.cache.backend {
        CacheBackend::Redis => {
            let store = RedisStore::connect(&config.cache.url).await?;
            tracing::info!("Connected to redis cache");
            Arc::new(store)
        }
        CacheBackend::Memory => Arc::new(MemoryStore::new()),
    };
    let cache = RoomCache::new(store);

    let rooms = RoomGateway::new(provider);
    let state = AppState::new(rooms, cache.clone());
    let webhook = WebhookState {
        cache,
        secret: config.webhook.secret.clone(),
    };

    let app = build_app(state, webhook, &config.server.allowed_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

fn show_config(config: Option<&UsherConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
