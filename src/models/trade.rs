//! Trade stream models.

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::PriceUpdate;
use crate::PipelineError;

/// A trade event from the `<symbol>@trade` stream.
///
/// Only the price and trade time are consumed; every other field the
/// exchange sends is ignored.
#[derive(Debug, Deserialize)]
pub struct TradeEvent {
    /// Trade price, sent as a decimal string.
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// Trade time in milliseconds since the epoch.
    #[serde(rename = "T")]
    pub trade_time: i64,
}

impl TradeEvent {
    /// Converts the event into a [`PriceUpdate`] for `symbol`, tagged with
    /// the feed's `epoch`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MalformedMessage`] if the price is not
    /// positive or the trade time is out of range.
    pub fn into_update(self, symbol: &str, epoch: u64) -> crate::Result<PriceUpdate> {
        if self.price <= Decimal::ZERO {
            return Err(PipelineError::MalformedMessage(format!(
                "non-positive price {}",
                self.price
            )));
        }
        let timestamp = DateTime::from_timestamp_millis(self.trade_time).ok_or_else(|| {
            PipelineError::MalformedMessage(format!("trade time out of range: {}", self.trade_time))
        })?;

        Ok(PriceUpdate {
            symbol: symbol.to_string(),
            price: self.price,
            timestamp,
            epoch,
        })
    }
}

/// Decodes a raw text frame into a [`PriceUpdate`].
///
/// # Errors
///
/// Returns [`PipelineError::MalformedMessage`] for undecodable payloads and
/// non-positive prices.
pub fn decode_trade(text: &str, symbol: &str, epoch: u64) -> crate::Result<PriceUpdate> {
    let event: TradeEvent = serde_json::from_str(text)
        .map_err(|e| PipelineError::MalformedMessage(e.to_string()))?;
    event.into_update(symbol, epoch)
}
