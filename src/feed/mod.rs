//! Upstream trade stream client.
//!
//! This module is organized by concern:
//! - [`connector`] - dialing the exchange and framing its messages
//! - [`signal`] - the single-slot planned-restart flag
//! - [`client`] - the connect/stream/retry loop and live symbol swaps

mod client;
mod connector;
mod signal;

pub use client::{ConnectionState, DIAL_RETRY_DELAY, FeedClient, STREAM_RETRY_DELAY};
pub use connector::{Connector, FeedStream, WsConnector};
pub use signal::RestartSignal;

/// Builds the trade stream URL for `symbol` under `base_url`.
///
/// The exchange expects the lowercase symbol, e.g. `<base>/btcusdt@trade`.
pub fn stream_url(base_url: &str, symbol: &str) -> String {
    format!(
        "{}/{}@trade",
        base_url.trim_end_matches('/'),
        symbol.to_ascii_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_lowercases_symbol() {
        assert_eq!(
            stream_url("wss://stream.binance.com:9443/ws", "BTCUSDT"),
            "wss://stream.binance.com:9443/ws/btcusdt@trade"
        );
    }

    #[test]
    fn stream_url_tolerates_trailing_slash() {
        assert_eq!(stream_url("ws://host/ws/", "ethusdt"), "ws://host/ws/ethusdt@trade");
    }
}
