//! Trade history storage.
//!
//! The server appends every accepted trade and serves recent ones from
//! `/api/history`. [`MemoryTradeStore`] keeps a bounded ring; anything that
//! implements [`TradeStore`] can stand in for it.

use std::collections::VecDeque;

use parking_lot::RwLock;

use crate::models::PriceUpdate;
use crate::models::api::HistoryTrade;

/// Maximum number of rows returned by one history query.
pub const HISTORY_QUERY_LIMIT: usize = 100;

/// Append/query interface for persisted trades.
pub trait TradeStore: Send + Sync {
    /// Stores one trade.
    fn append(&self, update: &PriceUpdate);

    /// Returns up to `limit` most recent trades for `symbol`, newest first.
    fn recent(&self, symbol: &str, limit: usize) -> Vec<HistoryTrade>;
}

/// Bounded in-memory trade log; the oldest trade is evicted when full.
#[derive(Debug)]
pub struct MemoryTradeStore {
    capacity: usize,
    trades: RwLock<VecDeque<HistoryTrade>>,
}

impl MemoryTradeStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            trades: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }
}

impl TradeStore for MemoryTradeStore {
    fn append(&self, update: &PriceUpdate) {
        let mut trades = self.trades.write();
        if trades.len() >= self.capacity {
            trades.pop_front();
        }
        trades.push_back(HistoryTrade {
            symbol: update.symbol.clone(),
            price: update.price,
            timestamp: update.timestamp,
        });
    }

    fn recent(&self, symbol: &str, limit: usize) -> Vec<HistoryTrade> {
        self.trades
            .read()
            .iter()
            .rev()
            .filter(|t| t.symbol == symbol)
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use rust_decimal::Decimal;

    use super::*;

    fn update(symbol: &str, price: i64, ms: i64) -> PriceUpdate {
        PriceUpdate {
            symbol: symbol.to_string(),
            price: Decimal::from(price),
            timestamp: DateTime::from_timestamp_millis(ms).unwrap(),
            epoch: 0,
        }
    }

    #[test]
    fn recent_is_newest_first_and_filtered() {
        let store = MemoryTradeStore::new(10);
        store.append(&update("btcusdt", 1, 1));
        store.append(&update("ethusdt", 2, 2));
        store.append(&update("btcusdt", 3, 3));

        let btc = store.recent("btcusdt", 10);
        let prices: Vec<_> = btc.iter().map(|t| t.price).collect();
        assert_eq!(prices, [Decimal::from(3), Decimal::from(1)]);
        assert!(btc.iter().all(|t| t.symbol == "btcusdt"));
    }

    #[test]
    fn evicts_oldest_when_full() {
        let store = MemoryTradeStore::new(2);
        store.append(&update("ethusdt", 9, 0));
        for i in 1..=3 {
            store.append(&update("btcusdt", i, i));
        }
        assert!(store.recent("ethusdt", 10).is_empty());
        let prices: Vec<_> = store
            .recent("btcusdt", 10)
            .iter()
            .map(|t| t.price)
            .collect();
        assert_eq!(prices, [Decimal::from(3), Decimal::from(2)]);
    }

    #[test]
    fn limit_caps_result() {
        let store = MemoryTradeStore::new(10);
        for i in 1..=5 {
            store.append(&update("solusdt", i, i));
        }
        assert_eq!(store.recent("solusdt", 2).len(), 2);
        assert!(store.recent("xrpusdt", 2).is_empty());
    }
}
