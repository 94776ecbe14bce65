//! Shared data models.
//!
//! - [`trade`] - upstream trade stream payloads
//! - [`api`] - JSON bodies of the local HTTP/WebSocket surface
//!
//! [`PriceUpdate`] is the normalized value that flows from the feed into the
//! price hub, the statistics engine and the history store.

pub mod api;
pub mod trade;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// A single accepted trade price for one symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceUpdate {
    /// Symbol whose stream produced the trade (lowercase).
    pub symbol: String,
    /// Trade price, always positive.
    pub price: Decimal,
    /// Exchange trade time.
    pub timestamp: DateTime<Utc>,
    /// Swap epoch the feed connection was opened under.
    pub epoch: u64,
}
