use anyhow::{Context, Result};
use axum::{Router, routing::get};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tandem_server::{AppState, Relay, RoomDirectory, SignalingService, ws_handler};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[derive(Parser)]
#[command(name = "tandem-server", about = "Two-party call signaling relay")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8500")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tandem_server=info".into()),
        )
        .init();

    let args = Args::parse();

    let directory = Arc::new(RoomDirectory::new());
    let signaling = SignalingService::new();
    let relay = Arc::new(Relay::new(directory, Arc::new(signaling.clone())));

    // Browser clients connect from another origin, so CORS stays open.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(AppState { signaling, relay });

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    info!("Signaling relay listening on {}", args.listen);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
