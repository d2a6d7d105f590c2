//! Webhook relay binary.

use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webhook_relay::{create_router, AppState, Config, Relay, UpstreamClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting webhook relay");

    let config: Config = config::Config::builder()
        .add_source(config::File::with_name("relay").required(false))
        .add_source(config::Environment::with_prefix("RELAY"))
        .build()
        .and_then(|c| c.try_deserialize())
        .unwrap_or_else(|e| {
            error!(error = %e, "FATAL: Config error, fix RELAY_* env vars or relay.toml");
            std::process::exit(1);
        });

    let relay_config = config.relay_config().unwrap_or_else(|e| {
        error!(error = %e, "FATAL: Invalid relay configuration");
        std::process::exit(1);
    });

    if !relay_config.has_secret() {
        warn!("RELAY_SECRET not set, deliveries are relayed without signature validation");
    }

    info!(
        provider = %relay_config.provider,
        upstreams = ?relay_config.upstreams,
        allowed_paths = ?relay_config.allowed_paths,
        "Configuration loaded"
    );

    let client = UpstreamClient::new(config.upstream_timeout())?;
    let relay = Relay::new(relay_config, client, config.max_body_bytes)?;
    let state = Arc::new(AppState::new(relay));

    let app = create_router(state);

    info!(address = %config.bind_address, "Listening");

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Relay shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
