//! Supported trading pairs and the process-wide active symbol.

use parking_lot::RwLock;
use serde::Serialize;

use crate::{PipelineError, Result};

/// A tradable pair offered by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Coin {
    pub symbol: &'static str,
    pub name: &'static str,
}

/// Ordered list of supported pairs.
pub const COINS: [Coin; 6] = [
    Coin {
        symbol: "btcusdt",
        name: "Bitcoin (BTC)",
    },
    Coin {
        symbol: "ethusdt",
        name: "Ethereum (ETH)",
    },
    Coin {
        symbol: "solusdt",
        name: "Solana (SOL)",
    },
    Coin {
        symbol: "bnbusdt",
        name: "Binance Coin (BNB)",
    },
    Coin {
        symbol: "xrpusdt",
        name: "Ripple (XRP)",
    },
    Coin {
        symbol: "dogeusdt",
        name: "Dogecoin (DOGE)",
    },
];

/// Finds a coin by symbol, ignoring case and surrounding whitespace.
pub fn lookup(symbol: &str) -> Option<&'static Coin> {
    let wanted = symbol.trim().to_ascii_lowercase();
    COINS.iter().find(|coin| coin.symbol == wanted)
}

/// The currently tracked pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolContext {
    pub symbol: String,
    pub display_name: String,
}

impl SymbolContext {
    /// Builds a context for a catalog symbol.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownSymbol`] if `symbol` is not listed.
    pub fn for_symbol(symbol: &str) -> Result<Self> {
        lookup(symbol)
            .map(Self::from)
            .ok_or_else(|| PipelineError::UnknownSymbol(symbol.to_string()))
    }
}

impl From<&Coin> for SymbolContext {
    fn from(coin: &Coin) -> Self {
        Self {
            symbol: coin.symbol.to_string(),
            display_name: coin.name.to_string(),
        }
    }
}

/// Shared holder for the active [`SymbolContext`] and its swap epoch.
///
/// Symbol, display name and epoch live in one value behind one lock, so
/// readers never observe one without the others. Every swap bumps the
/// epoch, including a swap to the symbol that is already active.
#[derive(Debug)]
pub struct ActiveSymbol {
    inner: RwLock<Current>,
}

#[derive(Debug)]
struct Current {
    context: SymbolContext,
    epoch: u64,
}

impl ActiveSymbol {
    pub fn new(context: SymbolContext) -> Self {
        Self {
            inner: RwLock::new(Current { context, epoch: 0 }),
        }
    }

    /// Returns a copy of the active context.
    pub fn get(&self) -> SymbolContext {
        self.inner.read().context.clone()
    }

    /// Returns only the active symbol.
    pub fn symbol(&self) -> String {
        self.inner.read().context.symbol.clone()
    }

    /// Number of swaps so far.
    pub fn epoch(&self) -> u64 {
        self.inner.read().epoch
    }

    /// Runs `f` only if `symbol` and `epoch` are current, holding the
    /// context steady while `f` runs so a concurrent swap lands strictly
    /// before or after.
    pub fn when_current<R>(&self, symbol: &str, epoch: u64, f: impl FnOnce() -> R) -> Option<R> {
        let guard = self.inner.read();
        if guard.epoch != epoch || guard.context.symbol != symbol {
            return None;
        }
        let result = f();
        drop(guard);
        Some(result)
    }

    /// Publishes `context` and returns the new epoch.
    pub(crate) fn set(&self, context: SymbolContext) -> u64 {
        let mut current = self.inner.write();
        current.context = context;
        current.epoch += 1;
        current.epoch
    }
}
