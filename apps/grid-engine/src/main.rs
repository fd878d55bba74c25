//! Grid Engine Binary
//!
//! Starts the grid-strategy simulation and screening service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin grid-engine [-- <config.yaml>]
//! ```
//!
//! # Environment Variables
//!
//! - `GRID_ENGINE_HOST`: HTTP bind host (default: 0.0.0.0)
//! - `GRID_ENGINE_PORT`: HTTP bind port (default: 8080)
//! - `GRID_ENGINE_BINANCE_URL`: exchange REST base URL
//! - `GRID_ENGINE_QUOTE_ASSET`: screening quote asset (default: USDC)
//! - `RUST_LOG`: log level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use grid_engine::config::Config;
use grid_engine::market::{BinanceMarketData, KlineSource, SymbolUniverse};
use grid_engine::server::{AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config_path: Option<PathBuf> = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref()).context("failed to load configuration")?;

    info!(
        bind = %config.bind_addr(),
        exchange = %config.market.base_url,
        quote_asset = %config.market.quote_asset,
        "Starting Grid Engine"
    );

    let market = Arc::new(
        BinanceMarketData::new(
            config.market.base_url.clone(),
            config.market.quote_asset.clone(),
            config.retry(),
        )
        .context("failed to build exchange adapter")?,
    );
    let klines: Arc<dyn KlineSource> = market.clone();
    let universe: Arc<dyn SymbolUniverse> = market;

    let state = AppState::new(klines, universe, config.screening());
    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Grid Engine stopped");
    Ok(())
}

/// Uses static directive strings that are compile-time constants guaranteed to parse.
#[allow(clippy::expect_used)]
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "grid_engine=info"
                    .parse()
                    .expect("static directive 'grid_engine=info' is valid"),
            ),
        )
        .init();
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
