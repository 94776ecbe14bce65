//! Swap coordinator and ingest ordering tests.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tickerpipe::PipelineError;
use tickerpipe::catalog::{ActiveSymbol, SymbolContext};
use tickerpipe::hub::PriceHub;
use tickerpipe::models::PriceUpdate;
use tickerpipe::models::api::StatsResponse;
use tickerpipe::server::run_ingest;
use tickerpipe::stats::{SessionStats, StatsEngine};
use tickerpipe::store::{MemoryTradeStore, TradeStore};
use tickerpipe::swap::{FeedControl, SwapCoordinator};
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};

/// What the rest of the pipeline looked like when the feed was told to move.
#[derive(Debug)]
struct FeedCall {
    symbol: String,
    epoch: u64,
    active: String,
    price: Option<Decimal>,
    stats: StatsResponse,
}

/// Feed stand-in that snapshots hub, stats and context on every call.
struct RecordingFeed {
    active: Arc<ActiveSymbol>,
    stats: Arc<dyn StatsEngine>,
    hub: Arc<PriceHub>,
    calls: Mutex<Vec<FeedCall>>,
}

impl FeedControl for RecordingFeed {
    fn change_symbol(&self, symbol: &str, epoch: u64) {
        self.calls.lock().push(FeedCall {
            symbol: symbol.to_string(),
            epoch,
            active: self.active.symbol(),
            price: self.hub.current_price(),
            stats: self.stats.snapshot(),
        });
    }
}

struct Fixture {
    active: Arc<ActiveSymbol>,
    stats: Arc<dyn StatsEngine>,
    hub: Arc<PriceHub>,
    feed: Arc<RecordingFeed>,
    swap: SwapCoordinator,
}

fn fixture() -> Fixture {
    let active = Arc::new(ActiveSymbol::new(
        SymbolContext::for_symbol("btcusdt").expect("btcusdt is listed"),
    ));
    let stats: Arc<dyn StatsEngine> = Arc::new(SessionStats::new());
    let hub = Arc::new(PriceHub::new(Arc::clone(&stats)));
    let feed = Arc::new(RecordingFeed {
        active: Arc::clone(&active),
        stats: Arc::clone(&stats),
        hub: Arc::clone(&hub),
        calls: Mutex::new(Vec::new()),
    });
    let swap = SwapCoordinator::new(
        Arc::clone(&active),
        Arc::clone(&stats),
        Arc::clone(&hub),
        feed.clone(),
    );
    Fixture {
        active,
        stats,
        hub,
        feed,
        swap,
    }
}

fn update(symbol: &str, price: Decimal, epoch: u64) -> PriceUpdate {
    PriceUpdate {
        symbol: symbol.to_string(),
        price,
        timestamp: Utc::now(),
        epoch,
    }
}

/// Spawns an ingest task over the fixture's components.
fn spawn_ingest(
    f: &Fixture,
    store: &Arc<MemoryTradeStore>,
) -> (mpsc::Sender<PriceUpdate>, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(8);
    let ingest = tokio::spawn(run_ingest(
        rx,
        Arc::clone(&f.active),
        Arc::clone(&f.hub),
        store.clone(),
    ));
    (tx, ingest)
}

#[test]
fn test_swap_resets_before_feed_moves() {
    let f = fixture();
    f.hub.update_price(&update("btcusdt", dec!(60000), 0));
    f.hub.update_price(&update("btcusdt", dec!(61000), 0));

    let context = assert_ok!(f.swap.swap_to("ETHUSDT"));
    assert_eq!(context.symbol, "ethusdt");
    assert_eq!(context.display_name, "Ethereum (ETH)");

    let calls = f.feed.calls.lock();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.symbol, "ethusdt");
    assert_eq!(call.epoch, 1);
    assert_eq!(call.active, "ethusdt");
    assert_eq!(call.price, None);
    assert_eq!(call.stats, StatsResponse::default());
}

#[test]
fn test_unknown_symbol_changes_nothing() {
    let f = fixture();
    f.hub.update_price(&update("btcusdt", dec!(100), 0));

    let err = assert_err!(f.swap.swap_to("adausdt"));
    assert!(matches!(err, PipelineError::UnknownSymbol(ref s) if s == "adausdt"));
    assert_eq!(err.to_string(), "Unknown symbol: adausdt");

    assert!(f.feed.calls.lock().is_empty());
    assert_eq!(f.active.symbol(), "btcusdt");
    assert_eq!(f.hub.current_price(), Some(dec!(100)));
    assert_eq!(f.stats.high(), dec!(100));
}

#[test]
fn test_swap_to_active_symbol_still_resets() {
    let f = fixture();
    f.hub.update_price(&update("btcusdt", dec!(100), 0));

    assert_ok!(f.swap.swap_to("btcusdt"));

    assert_eq!(f.hub.current_price(), None);
    assert_eq!(f.active.epoch(), 1);
    assert_eq!(f.feed.calls.lock().len(), 1);
}

#[test]
fn test_concurrent_swaps_settle_on_one_symbol() {
    let f = Arc::new(fixture());
    let symbols = ["ethusdt", "solusdt", "xrpusdt", "dogeusdt"];

    let handles: Vec<_> = symbols
        .iter()
        .copied()
        .map(|symbol| {
            let f = Arc::clone(&f);
            std::thread::spawn(move || f.swap.swap_to(symbol).map(|_| ()))
        })
        .collect();
    for handle in handles {
        handle
            .join()
            .expect("swap thread panicked")
            .expect("listed symbol");
    }

    let calls = f.feed.calls.lock();
    assert_eq!(calls.len(), symbols.len());
    // Every swap saw its own context, and the feed's last target is the
    // symbol that stayed active.
    assert!(calls.iter().all(|c| c.symbol == c.active));
    assert_eq!(calls.last().map(|c| c.symbol.clone()), Some(f.active.symbol()));
    let epochs: Vec<_> = calls.iter().map(|c| c.epoch).collect();
    assert_eq!(epochs, [1, 2, 3, 4]);
}

#[tokio::test]
async fn test_ingest_drops_stale_symbol_updates() {
    let f = fixture();
    let store = Arc::new(MemoryTradeStore::new(10));
    let (tx, ingest) = spawn_ingest(&f, &store);

    assert_ok!(f.swap.swap_to("ethusdt"));

    tx.send(update("btcusdt", dec!(60000), 0)).await.expect("ingest alive");
    tx.send(update("ethusdt", dec!(3000), 1)).await.expect("ingest alive");
    drop(tx);
    ingest.await.expect("ingest task exits");

    assert_eq!(f.hub.current_price(), Some(dec!(3000)));
    assert_eq!(f.stats.high(), dec!(3000));
    assert_eq!(f.stats.low(), dec!(3000));

    assert!(store.recent("btcusdt", 10).is_empty());
    let eth = store.recent("ethusdt", 10);
    assert_eq!(eth.len(), 1);
    assert_eq!(eth[0].price, dec!(3000));
}

#[tokio::test]
async fn test_ingest_drops_pre_swap_trades_of_same_symbol() {
    let f = fixture();
    let store = Arc::new(MemoryTradeStore::new(10));
    let (tx, ingest) = spawn_ingest(&f, &store);

    // btc -> eth -> btc leaves epoch-0 btc trades queued behind the swaps.
    assert_ok!(f.swap.swap_to("ethusdt"));
    assert_ok!(f.swap.swap_to("btcusdt"));
    assert_eq!(f.active.epoch(), 2);

    tx.send(update("btcusdt", dec!(60000), 0)).await.expect("ingest alive");
    tx.send(update("ethusdt", dec!(3000), 1)).await.expect("ingest alive");
    tx.send(update("btcusdt", dec!(61000), 2)).await.expect("ingest alive");
    drop(tx);
    ingest.await.expect("ingest task exits");

    assert_eq!(f.hub.current_price(), Some(dec!(61000)));
    assert_eq!(f.stats.low(), dec!(61000));
    let btc: Vec<_> = store.recent("btcusdt", 10).iter().map(|t| t.price).collect();
    assert_eq!(btc, [dec!(61000)]);
}

#[tokio::test]
async fn test_swap_to_active_symbol_discards_buffered_trades() {
    let f = fixture();
    let store = Arc::new(MemoryTradeStore::new(10));
    let (tx, ingest) = spawn_ingest(&f, &store);

    assert_ok!(f.swap.swap_to("btcusdt"));

    tx.send(update("btcusdt", dec!(100), 0)).await.expect("ingest alive");
    drop(tx);
    ingest.await.expect("ingest task exits");

    assert_eq!(f.hub.current_price(), None);
    assert_eq!(f.stats.snapshot(), StatsResponse::default());
    assert!(store.recent("btcusdt", 10).is_empty());
}
