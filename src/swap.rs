//! Symbol hot-swap coordination.
//!
//! A swap runs four steps in a fixed order: publish the new context, reset
//! statistics, reset the stored price, and only then point the feed at the
//! new symbol. Statistics and price are therefore already empty by the time
//! the first new-symbol trade can arrive. Each swap also bumps the epoch, so
//! trades read before it are told apart even when the symbol is unchanged.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::Result;
use crate::catalog::{ActiveSymbol, SymbolContext};
use crate::feed::{Connector, FeedClient};
use crate::hub::PriceHub;
use crate::stats::StatsEngine;

/// The part of the feed client a swap needs.
pub trait FeedControl: Send + Sync {
    fn change_symbol(&self, symbol: &str, epoch: u64);
}

impl<C: Connector> FeedControl for FeedClient<C> {
    fn change_symbol(&self, symbol: &str, epoch: u64) {
        FeedClient::change_symbol(self, symbol, epoch);
    }
}

/// Changes the active symbol across context, statistics, hub and feed.
pub struct SwapCoordinator {
    active: Arc<ActiveSymbol>,
    stats: Arc<dyn StatsEngine>,
    hub: Arc<PriceHub>,
    feed: Arc<dyn FeedControl>,
    in_progress: Mutex<()>,
}

impl SwapCoordinator {
    pub fn new(
        active: Arc<ActiveSymbol>,
        stats: Arc<dyn StatsEngine>,
        hub: Arc<PriceHub>,
        feed: Arc<dyn FeedControl>,
    ) -> Self {
        Self {
            active,
            stats,
            hub,
            feed,
            in_progress: Mutex::new(()),
        }
    }

    /// Makes `symbol` the active pair.
    ///
    /// Concurrent swaps are serialized; the last one to run wins for every
    /// component.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownSymbol`](crate::PipelineError::UnknownSymbol)
    /// without touching any component if `symbol` is not in the catalog.
    pub fn swap_to(&self, symbol: &str) -> Result<SymbolContext> {
        let context = SymbolContext::for_symbol(symbol)?;

        let _guard = self.in_progress.lock();
        let previous = self.active.get();
        let epoch = self.active.set(context.clone());
        self.stats.reset();
        self.hub.reset();
        self.feed.change_symbol(&context.symbol, epoch);

        info!(
            from = %previous.symbol,
            to = %context.symbol,
            epoch,
            name = %context.display_name,
            "Active symbol changed"
        );
        Ok(context)
    }
}
