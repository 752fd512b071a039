//! docent-server - REST API server binary.

use std::net::SocketAddr;

use docent_core::config::DocentConfig;
use docent_server::{create_server, AppState};
use tokio::signal;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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
}

fn load_config() -> Result<DocentConfig, Box<dyn std::error::Error>> {
    let config = match std::env::var("DOCENT_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading configuration file");
            let mut config = DocentConfig::from_file(&path)?;
            config.apply_env();
            config
        }
        Err(_) => DocentConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("docent_server=debug".parse()?),
        )
        .init();

    let host = std::env::var("DOCENT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("DOCENT_PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse()
        .map_err(|_| "DOCENT_PORT must be a valid port number")?;

    let config = load_config()?;
    let state = AppState::from_config(config).await?;
    {
        let engine = state.engine().await;
        info!(
            requested = %engine.config().mode,
            effective = %engine.effective_mode(),
            reranker = engine.has_reranker(),
            "Retrieval engine ready"
        );
    }

    let app = create_server(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting docent-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}
