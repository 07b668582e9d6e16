use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paperlens::cli::Cli;
use paperlens::config::Config;
use paperlens::llm::build_provider;
use paperlens::session::{PruningConfig, SessionManager, SessionPruner, ViewController};
use paperlens::web::{AppState, GatewayServer, build_router};

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "paperlens=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(bind) = cli.bind {
        config.gateway.bind = bind;
    }
    tracing::debug!(?config, "Loaded configuration");

    if cli.check {
        println!("Configuration OK");
        println!("  model endpoint: {}", config.inference.endpoint);
        println!("  bind address:   {}", config.gateway.bind);
        return Ok(());
    }

    let provider = build_provider(&config.inference).context("Failed to build inference client")?;
    let cache = provider.cache().clone();

    let sessions = SessionManager::new();
    let pruner = SessionPruner::new(PruningConfig::from(&config.gateway)).spawn(sessions.clone());

    let controller = ViewController::new(provider)
        .with_max_upload_bytes(config.gateway.max_upload_bytes)
        .with_max_staged_bytes(config.gateway.max_staged_bytes);
    let state = AppState::new(sessions, controller).with_cache(cache);
    let app = build_router(state, config.gateway.max_upload_bytes);

    let mut server = GatewayServer::new(config.gateway.bind);
    let addr = server.start(app).await?;
    tracing::info!(url = %format!("http://{addr}"), "paperlens is ready");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    server.shutdown().await;
    pruner.abort();
    Ok(())
}
