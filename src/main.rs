use actions_cache_shim::utils::cli::Args;
use actions_cache_shim::utils::handshake::{ReadyMessage, export_cache_url};
use actions_cache_shim::{AppState, create_router};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if !args.service_v2 {
        tracing::warn!("Actions Cache Service v2 API is not enabled. Skip setting up shim.");
        return Ok(());
    }

    let config = match args.validate() {
        Ok(config) => config,
        Err(validation_errors) => {
            anyhow::bail!("invalid configuration:\n{}", validation_errors.join("\n"));
        }
    };
    let github_env = config.github_env.clone();
    let bind_addr = format!("{}:{}", config.host, config.port);

    let state = Arc::new(AppState::new(config).context("failed to build backend clients")?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {bind_addr}"))?;
    let ready = ReadyMessage::new(listener.local_addr()?);
    tracing::info!("listening on {}", ready.address);

    if let Some(env_file) = github_env {
        export_cache_url(&env_file, &ready.cache_url())
            .await
            .with_context(|| format!("failed to export cache URL to {}", env_file.display()))?;
    }
    println!("{}", serde_json::to_string(&ready)?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down...");
}
