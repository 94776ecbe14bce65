//! Application configuration loaded from environment variables.
//!
//! Every setting has a default, so the pipeline runs without any
//! environment at all:
//! - `TICKERPIPE_FEED_URL`: upstream stream base (default Binance public endpoint)
//! - `TICKERPIPE_BIND_ADDR`: local API listen address
//! - `TICKERPIPE_SERVER_URL`: base URL the dashboard polls
//! - `TICKERPIPE_SYMBOL`: initial symbol for `serve`
//! - `TICKERPIPE_HISTORY_CAPACITY`: number of trades kept for `/api/history`

use std::net::SocketAddr;

use crate::PipelineError;
use crate::catalog;

/// Default public trade stream endpoint.
const DEFAULT_FEED_URL: &str = "wss://stream.binance.com:9443/ws";

/// Default listen address for the local API.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Default base URL the dashboard talks to.
const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Symbol tracked when nothing else is requested.
const DEFAULT_SYMBOL: &str = "btcusdt";

/// Default number of trades retained by the history store.
const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub server: ServerConfig,
}

/// Upstream feed settings.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Base URL; the stream path `<symbol>@trade` is appended to it.
    pub base_url: String,
    /// Symbol the feed starts on.
    pub symbol: String,
}

/// Local API settings, shared by the server and the dashboard client.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub base_url: String,
    pub history_capacity: usize,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] if the bind address does not parse,
/// the history capacity is not a positive integer, or the initial symbol is
/// not in the coin catalog.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let base_url = non_empty_var("TICKERPIPE_FEED_URL")
        .unwrap_or_else(|| DEFAULT_FEED_URL.to_string())
        .trim_end_matches('/')
        .to_string();

    let symbol = non_empty_var("TICKERPIPE_SYMBOL").unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
    let symbol = catalog::lookup(&symbol)
        .map(|coin| coin.symbol.to_string())
        .ok_or_else(|| {
            PipelineError::Config(format!("TICKERPIPE_SYMBOL is not a known symbol: {symbol}"))
        })?;

    let bind_raw =
        non_empty_var("TICKERPIPE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| {
        PipelineError::Config(format!("TICKERPIPE_BIND_ADDR is invalid ({bind_raw}): {e}"))
    })?;

    let server_url = non_empty_var("TICKERPIPE_SERVER_URL")
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
        .trim_end_matches('/')
        .to_string();

    let history_capacity = match non_empty_var("TICKERPIPE_HISTORY_CAPACITY") {
        None => DEFAULT_HISTORY_CAPACITY,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(PipelineError::Config(format!(
                    "TICKERPIPE_HISTORY_CAPACITY must be a positive integer, got {raw}"
                )));
            }
        },
    };

    Ok(AppConfig {
        feed: FeedConfig { base_url, symbol },
        server: ServerConfig {
            bind_addr,
            base_url: server_url,
            history_capacity,
        },
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
