//! Local API models.
//!
//! Field names here are a compatibility contract with every dashboard and
//! WebSocket client, so they never change. Decimals travel as JSON numbers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Coin, SymbolContext};

/// Body of `GET /api/price` and of every `/ws` push.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Body of `GET /api/stats`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub moving_average: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub low: Decimal,
}

/// Body of `GET /api/symbol` and of a successful `POST /api/symbol`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolResponse {
    pub symbol: String,
    pub name: String,
}

impl From<SymbolContext> for SymbolResponse {
    fn from(context: SymbolContext) -> Self {
        Self {
            symbol: context.symbol,
            name: context.display_name,
        }
    }
}

/// Body of `POST /api/symbol`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SymbolRequest {
    pub symbol: String,
}

/// One entry of `GET /api/coins`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInfo {
    pub symbol: String,
    pub name: String,
}

impl From<&Coin> for CoinInfo {
    fn from(coin: &Coin) -> Self {
        Self {
            symbol: coin.symbol.to_string(),
            name: coin.name.to_string(),
        }
    }
}

/// One entry of `GET /api/history`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTrade {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Body of every 4xx answer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
