//! Feed client lifecycle tests on a paused clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Dial, ScriptedConnector, UPSTREAM_URL, trade_frame};
use rust_decimal_macros::dec;
use tickerpipe::PipelineError;
use tickerpipe::feed::{ConnectionState, DIAL_RETRY_DELAY, FeedClient, STREAM_RETRY_DELAY};
use tokio::sync::{Notify, mpsc};

/// Slack allowed on top of an exact retry delay.
const TOLERANCE: Duration = Duration::from_millis(50);

fn client(
    script: Vec<Dial>,
) -> (
    FeedClient<ScriptedConnector>,
    mpsc::Receiver<tickerpipe::models::PriceUpdate>,
    mpsc::UnboundedReceiver<common::DialRecord>,
) {
    let (connector, dials) = ScriptedConnector::new(script);
    let (tx, rx) = mpsc::channel(16);
    (FeedClient::new(connector, UPSTREAM_URL, "btcusdt", tx), rx, dials)
}

#[tokio::test(start_paused = true)]
async fn test_dial_failures_retry_after_fixed_delay() {
    let (feed, mut prices, mut dials) = client(vec![
        Dial::Fail,
        Dial::Fail,
        Dial::Fail,
        Dial::open([trade_frame("100.5", 1_700_000_000_000)], true),
    ]);
    feed.start().expect("first start spawns the loop");

    let update = prices.recv().await.expect("a price after reconnecting");
    assert_eq!(update.price, dec!(100.5));
    assert_eq!(update.symbol, "btcusdt");
    assert_eq!(feed.connection_state(), ConnectionState::Streaming);

    let mut attempts = Vec::new();
    while let Ok(record) = dials.try_recv() {
        attempts.push(record);
    }
    assert_eq!(attempts.len(), 4);
    for pair in attempts.windows(2) {
        let gap = pair[1].at - pair[0].at;
        assert!(
            gap >= DIAL_RETRY_DELAY && gap < DIAL_RETRY_DELAY + TOLERANCE,
            "unexpected gap {gap:?}"
        );
    }
    assert!(attempts.iter().all(|r| r.url == "ws://upstream.test/ws/btcusdt@trade"));
}

#[tokio::test(start_paused = true)]
async fn test_planned_restart_reconnects_without_delay() {
    let (feed, mut prices, mut dials) = client(vec![
        Dial::open([trade_frame("100", 1_700_000_000_000)], true),
        Dial::open([trade_frame("2000", 1_700_000_000_500)], true),
    ]);
    feed.start().expect("start");

    let first = dials.recv().await.expect("first dial");
    prices.recv().await.expect("btc price");

    feed.change_symbol("ETHUSDT", 1);
    assert_eq!(feed.symbol(), "ethusdt");
    assert_eq!(feed.epoch(), 1);

    let second = dials.recv().await.expect("second dial");
    assert_eq!(second.url, "ws://upstream.test/ws/ethusdt@trade");
    assert!(second.at - first.at < STREAM_RETRY_DELAY);

    let update = prices.recv().await.expect("eth price");
    assert_eq!(update.symbol, "ethusdt");
    assert_eq!(update.price, dec!(2000));
    assert_eq!(update.epoch, 1);
}

#[tokio::test(start_paused = true)]
async fn test_unplanned_end_waits_before_reconnecting() {
    let (feed, mut prices, mut dials) = client(vec![
        Dial::open([trade_frame("100", 1_700_000_000_000)], false),
        Dial::open([trade_frame("101", 1_700_000_000_100)], true),
    ]);
    feed.start().expect("start");

    let first = dials.recv().await.expect("first dial");
    prices.recv().await.expect("first price");
    let second = dials.recv().await.expect("second dial");

    let gap = second.at - first.at;
    assert!(gap >= STREAM_RETRY_DELAY && gap < STREAM_RETRY_DELAY + TOLERANCE);
    assert_eq!(second.url, first.url);

    let update = prices.recv().await.expect("price after reconnect");
    assert_eq!(update.price, dec!(101));
}

#[tokio::test(start_paused = true)]
async fn test_stream_error_waits_before_reconnecting() {
    let (feed, mut prices, mut dials) = client(vec![
        Dial::Open {
            frames: vec![
                Ok(trade_frame("100", 1_700_000_000_000)),
                Err(PipelineError::Io("connection reset".to_string())),
            ],
            hold: true,
        },
        Dial::open(Vec::new(), true),
    ]);
    feed.start().expect("start");

    let first = dials.recv().await.expect("first dial");
    prices.recv().await.expect("first price");
    let second = dials.recv().await.expect("second dial");

    let gap = second.at - first.at;
    assert!(gap >= STREAM_RETRY_DELAY && gap < STREAM_RETRY_DELAY + TOLERANCE);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_payloads_are_dropped_in_order() {
    let (feed, mut prices, _dials) = client(vec![Dial::open(
        [
            trade_frame("1.10", 1_700_000_000_000),
            "not json".to_string(),
            r#"{"T":1700000000000}"#.to_string(),
            trade_frame("0", 1_700_000_000_001),
            trade_frame("-3", 1_700_000_000_002),
            trade_frame("1.20", 1_700_000_000_003),
            trade_frame("1.30", 1_700_000_000_004),
        ],
        true,
    )]);
    feed.start().expect("start");

    let mut received = Vec::new();
    for _ in 0..3 {
        received.push(prices.recv().await.expect("valid trade").price);
    }
    assert_eq!(received, [dec!(1.10), dec!(1.20), dec!(1.30)]);

    // Nothing else arrives and the connection stays up.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(prices.try_recv().is_err());
    assert_eq!(feed.connection_state(), ConnectionState::Streaming);
}

#[tokio::test(start_paused = true)]
async fn test_start_is_idempotent_across_clones() {
    let (feed, _prices, _dials) = client(vec![]);
    assert!(feed.start().is_some());
    assert!(feed.start().is_none());
    assert!(feed.clone().start().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_swap_during_dial_discards_stale_connection() {
    let gate = Arc::new(Notify::new());
    let (feed, mut prices, mut dials) = client(vec![
        Dial::Gated {
            gate: Arc::clone(&gate),
            frames: vec![Ok(trade_frame("100", 1_700_000_000_000))],
        },
        Dial::open([trade_frame("2500", 1_700_000_000_100)], true),
    ]);
    feed.start().expect("start");

    let first = dials.recv().await.expect("btc dial");
    assert!(first.url.ends_with("/btcusdt@trade"));

    feed.change_symbol("ethusdt", 1);
    gate.notify_one();

    let second = dials.recv().await.expect("eth dial");
    assert!(second.url.ends_with("/ethusdt@trade"));
    assert!(second.at - first.at < STREAM_RETRY_DELAY);

    let update = prices.recv().await.expect("eth price");
    assert_eq!(update.symbol, "ethusdt");
    assert_eq!(update.price, dec!(2500));
}

#[tokio::test(start_paused = true)]
async fn test_same_symbol_swap_during_dial_redials() {
    let gate = Arc::new(Notify::new());
    let (feed, mut prices, mut dials) = client(vec![
        Dial::Gated {
            gate: Arc::clone(&gate),
            frames: vec![Ok(trade_frame("100", 1_700_000_000_000))],
        },
        Dial::open([trade_frame("101", 1_700_000_000_100)], true),
    ]);
    feed.start().expect("start");

    let first = dials.recv().await.expect("first dial");
    feed.change_symbol("btcusdt", 1);
    gate.notify_one();

    let second = dials.recv().await.expect("redial");
    assert_eq!(second.url, first.url);
    assert!(second.at - first.at < STREAM_RETRY_DELAY);

    // Only trades from the connection opened under the new epoch arrive.
    let update = prices.recv().await.expect("price after redial");
    assert_eq!(update.price, dec!(101));
    assert_eq!(update.epoch, 1);
}

#[tokio::test(start_paused = true)]
async fn test_closed_consumer_stops_the_loop() {
    let (feed, prices, _dials) = client(vec![Dial::open(
        [
            trade_frame("1", 1_700_000_000_000),
            trade_frame("2", 1_700_000_000_001),
        ],
        true,
    )]);
    drop(prices);

    let handle = feed.start().expect("start");
    handle.await.expect("feed task exits cleanly");
    assert_eq!(feed.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_state_transitions_are_observable() {
    let (feed, mut prices, _dials) = client(vec![
        Dial::Fail,
        Dial::open([trade_frame("7", 1_700_000_000_000)], true),
    ]);
    let mut state = feed.watch_state();
    assert_eq!(*state.borrow(), ConnectionState::Disconnected);

    feed.start().expect("start");
    prices.recv().await.expect("price");

    state
        .wait_for(|s| *s == ConnectionState::Streaming)
        .await
        .expect("state sender alive");
}
