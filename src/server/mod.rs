//! Local service surface: the pipeline plus its HTTP/WebSocket API.
//!
//! - `GET  /api/price`   current price
//! - `GET  /api/stats`   moving average, session high and low
//! - `GET  /api/symbol`  active symbol; `POST` swaps it
//! - `GET  /api/coins`   supported pairs
//! - `GET  /api/history` recent trades for the active symbol
//! - `GET  /ws`          one `{ "price": n }` push per update

mod pipeline;
mod routes;

use std::future::Future;

use tokio::net::TcpListener;
use tracing::info;

pub use pipeline::{Pipeline, PipelineTasks, run_ingest};
pub use routes::{ApiError, AppState, create_router};

use crate::catalog::SymbolContext;
use crate::config::AppConfig;
use crate::feed::WsConnector;
use crate::{PipelineError, Result};

/// Serves the API on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the server fails while accepting.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Runs the full server process: feed, ingest and API, until Ctrl-C.
///
/// # Errors
///
/// Returns an error if `symbol` is not in the catalog or the bind address
/// cannot be bound. Both are fatal at startup.
pub async fn run_server(config: &AppConfig, symbol: &str) -> Result<()> {
    let initial = SymbolContext::for_symbol(symbol)?;

    let listener = TcpListener::bind(config.server.bind_addr)
        .await
        .map_err(|e| {
            PipelineError::Io(format!("failed to bind {}: {e}", config.server.bind_addr))
        })?;

    let mut pipeline = Pipeline::new(
        WsConnector,
        config.feed.base_url.clone(),
        initial.clone(),
        config.server.history_capacity,
    );
    let state = pipeline.app_state();
    let tasks = pipeline.start();

    info!(
        symbol = %initial.symbol,
        name = %initial.display_name,
        addr = %config.server.bind_addr,
        "Server listening"
    );

    serve(listener, state, shutdown_signal()).await?;

    if let Some(tasks) = tasks {
        tasks.feed.abort();
        tasks.ingest.abort();
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
