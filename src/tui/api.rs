//! HTTP client for the local API.
//!
//! Every method is a one-shot request; the runner spawns each call as its own
//! task and turns the result into a [`Message`].

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::app::PollData;
use super::event::{Action, Message};
use crate::models::api::{
    CoinInfo, ErrorResponse, HistoryTrade, PriceResponse, StatsResponse, SymbolRequest,
    SymbolResponse,
};
use crate::{PipelineError, Result};

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

const SERVER_DOWN: &str = "Server not running. Start with 'tickerpipe serve'";
const PRICE_FAILED: &str = "Failed to fetch price";
const STATS_FAILED: &str = "Failed to fetch stats";

/// Client for the endpoints served by `tickerpipe serve`.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetches symbol, price and stats in that order.
    ///
    /// The first failing stage aborts the poll; its message is what the
    /// dashboard shows instead of market data.
    pub async fn poll(&self) -> std::result::Result<PollData, String> {
        let symbol: SymbolResponse = self
            .get("/api/symbol")
            .await
            .map_err(|_| SERVER_DOWN.to_string())?;
        let price: PriceResponse = self
            .get("/api/price")
            .await
            .map_err(|_| PRICE_FAILED.to_string())?;
        let stats: StatsResponse = self
            .get("/api/stats")
            .await
            .map_err(|_| STATS_FAILED.to_string())?;

        Ok(PollData {
            symbol,
            price: price.price,
            stats,
        })
    }

    /// Fetches the coin catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    pub async fn coins(&self) -> Result<Vec<CoinInfo>> {
        self.get("/api/coins").await
    }

    /// Fetches recent trades for the active symbol, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    pub async fn history(&self) -> Result<Vec<HistoryTrade>> {
        self.get("/api/history").await
    }

    /// Asks the server to track `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Server`] with the server's message when the
    /// request is rejected, or a transport error.
    pub async fn change_symbol(&self, symbol: &str) -> Result<SymbolResponse> {
        let response = self
            .client
            .post(self.url("/api/symbol"))
            .json(&SymbolRequest {
                symbol: symbol.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            let body: ErrorResponse = response.json().await?;
            return Err(PipelineError::Server(body.error));
        }
        if !status.is_success() {
            return Err(PipelineError::Server(format!("HTTP {status}")));
        }
        Ok(response.json().await?)
    }

    /// Runs `action` and wraps its outcome in the message it answers to.
    pub async fn execute(&self, action: Action) -> Message {
        match action {
            Action::Poll { generation } => Message::Polled {
                generation,
                result: self.poll().await,
            },
            Action::FetchCoins => {
                Message::CoinsLoaded(self.coins().await.map_err(|e| e.to_string()))
            }
            Action::FetchHistory => {
                Message::HistoryLoaded(self.history().await.map_err(|e| e.to_string()))
            }
            Action::ChangeSymbol(symbol) => Message::SymbolChanged(
                self.change_symbol(&symbol).await.map_err(|e| match e {
                    PipelineError::Server(message) => message,
                    other => other.to_string(),
                }),
            ),
        }
    }
}
