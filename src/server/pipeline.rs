//! Wiring of feed, hub, statistics, store and swap coordinator.
//!
//! Every component is an explicitly owned object; nothing is global, so
//! tests can run several independent pipelines side by side.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::routes::AppState;
use crate::catalog::{ActiveSymbol, SymbolContext};
use crate::feed::{Connector, FeedClient};
use crate::hub::PriceHub;
use crate::models::PriceUpdate;
use crate::stats::{SessionStats, StatsEngine};
use crate::store::{MemoryTradeStore, TradeStore};
use crate::swap::SwapCoordinator;

/// Capacity of the channel between the feed and the ingest task.
const PRICE_CHANNEL_CAPACITY: usize = 100;

/// All server-side components for one tracked pair.
pub struct Pipeline<C: Connector> {
    pub active: Arc<ActiveSymbol>,
    pub stats: Arc<dyn StatsEngine>,
    pub hub: Arc<PriceHub>,
    pub store: Arc<dyn TradeStore>,
    pub feed: FeedClient<C>,
    pub swap: Arc<SwapCoordinator>,
    price_rx: Option<mpsc::Receiver<PriceUpdate>>,
}

/// Background tasks spawned by [`Pipeline::start`].
pub struct PipelineTasks {
    pub feed: JoinHandle<()>,
    pub ingest: JoinHandle<()>,
}

impl<C: Connector> Pipeline<C> {
    /// Builds a pipeline with the default statistics engine and an
    /// in-memory store of `history_capacity` trades.
    pub fn new(
        connector: C,
        feed_base_url: impl Into<String>,
        initial: SymbolContext,
        history_capacity: usize,
    ) -> Self {
        Self::with_components(
            connector,
            feed_base_url,
            initial,
            Arc::new(SessionStats::new()),
            Arc::new(MemoryTradeStore::new(history_capacity)),
        )
    }

    /// Builds a pipeline around caller-provided statistics and store.
    pub fn with_components(
        connector: C,
        feed_base_url: impl Into<String>,
        initial: SymbolContext,
        stats: Arc<dyn StatsEngine>,
        store: Arc<dyn TradeStore>,
    ) -> Self {
        let (price_tx, price_rx) = mpsc::channel(PRICE_CHANNEL_CAPACITY);
        let feed = FeedClient::new(connector, feed_base_url, &initial.symbol, price_tx);
        let active = Arc::new(ActiveSymbol::new(initial));
        let hub = Arc::new(PriceHub::new(Arc::clone(&stats)));
        let swap = Arc::new(SwapCoordinator::new(
            Arc::clone(&active),
            Arc::clone(&stats),
            Arc::clone(&hub),
            Arc::new(feed.clone()),
        ));

        Self {
            active,
            stats,
            hub,
            store,
            feed,
            swap,
            price_rx: Some(price_rx),
        }
    }

    /// Starts the feed and the ingest task. Returns `None` on a second call.
    pub fn start(&mut self) -> Option<PipelineTasks> {
        let price_rx = self.price_rx.take()?;
        let feed = self.feed.start()?;
        let ingest = tokio::spawn(run_ingest(
            price_rx,
            Arc::clone(&self.active),
            Arc::clone(&self.hub),
            Arc::clone(&self.store),
        ));
        info!(symbol = %self.active.symbol(), "Pipeline started");
        Some(PipelineTasks { feed, ingest })
    }

    /// Handler state for the HTTP surface.
    pub fn app_state(&self) -> AppState {
        AppState {
            active: Arc::clone(&self.active),
            stats: Arc::clone(&self.stats),
            hub: Arc::clone(&self.hub),
            store: Arc::clone(&self.store),
            swap: Arc::clone(&self.swap),
        }
    }
}

/// Drains the feed channel into the hub and the store.
///
/// Updates tagged with anything but the active symbol and epoch are
/// stragglers from before a swap and are dropped.
pub async fn run_ingest(
    mut price_rx: mpsc::Receiver<PriceUpdate>,
    active: Arc<ActiveSymbol>,
    hub: Arc<PriceHub>,
    store: Arc<dyn TradeStore>,
) {
    while let Some(update) = price_rx.recv().await {
        let applied = active.when_current(&update.symbol, update.epoch, || {
            hub.update_price(&update);
            store.append(&update);
        });
        if applied.is_none() {
            debug!(
                symbol = %update.symbol,
                epoch = update.epoch,
                price = %update.price,
                "Dropping stale update"
            );
        }
    }
    info!("Price channel closed, ingest stopping");
}
