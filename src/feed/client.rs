//! Feed connection lifecycle management.
//!
//! [`FeedClient`] keeps one upstream trade stream open for the target
//! symbol, forwards decoded prices in arrival order, and reconnects after
//! every failure. A dial failure waits [`DIAL_RETRY_DELAY`]; a dropped
//! stream waits [`STREAM_RETRY_DELAY`] unless the drop was a planned
//! restart from [`FeedClient::change_symbol`], which reconnects at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::RwLock;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::connector::{Connector, FeedStream, WsConnector};
use super::signal::RestartSignal;
use super::stream_url;
use crate::models::PriceUpdate;
use crate::models::trade::decode_trade;

/// Wait after a failed dial before trying again.
pub const DIAL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Wait after an unplanned stream drop before reconnecting.
pub const STREAM_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Where the feed loop currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Streaming,
    Restarting,
}

/// Why the reader loop exited.
#[derive(Debug, PartialEq, Eq)]
enum DisconnectReason {
    /// The connection was closed by a symbol change.
    Closed,
    /// Reading from the connection failed.
    StreamError,
    /// The upstream ended the stream.
    Ended,
    /// The price consumer dropped its receiver (process shutting down).
    Shutdown,
}

/// Target symbol and epoch plus the close handle of the live connection,
/// if any.
#[derive(Debug)]
struct Target {
    symbol: String,
    epoch: u64,
    close: Option<Arc<Notify>>,
}

struct Shared<C> {
    connector: C,
    base_url: String,
    target: RwLock<Target>,
    restart: RestartSignal,
    state: watch::Sender<ConnectionState>,
    output: mpsc::Sender<PriceUpdate>,
    started: AtomicBool,
}

/// Handle to the upstream feed. Clones share the same connection loop.
pub struct FeedClient<C = WsConnector> {
    shared: Arc<Shared<C>>,
}

impl<C> Clone for FeedClient<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Connector> FeedClient<C> {
    /// Creates a client for `symbol`; nothing connects until [`start`](Self::start).
    pub fn new(
        connector: C,
        base_url: impl Into<String>,
        symbol: &str,
        output: mpsc::Sender<PriceUpdate>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                connector,
                base_url: base_url.into(),
                target: RwLock::new(Target {
                    symbol: symbol.to_ascii_lowercase(),
                    epoch: 0,
                    close: None,
                }),
                restart: RestartSignal::new(),
                state,
                output,
                started: AtomicBool::new(false),
            }),
        }
    }

    /// The symbol the feed is (or will next be) streaming.
    pub fn symbol(&self) -> String {
        self.shared.target.read().symbol.clone()
    }

    /// Epoch every forwarded update is tagged with.
    pub fn epoch(&self) -> u64 {
        self.shared.target.read().epoch
    }

    /// Current position in the connect/stream/retry cycle.
    pub fn connection_state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Subscribes to connection state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Spawns the connection loop on the current runtime.
    ///
    /// Returns `None` if the loop was already started by this client or
    /// one of its clones.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self.shared.started.swap(true, Ordering::AcqRel) {
            warn!("Feed client already started");
            return None;
        }
        let client = self.clone();
        Some(tokio::spawn(client.run()))
    }

    /// Points the feed at `symbol` under `epoch` and closes the live
    /// connection.
    ///
    /// Returns immediately; the loop reconnects without delay for the new
    /// symbol. Calls made while a restart is still pending collapse into
    /// one reconnect for the latest symbol.
    pub fn change_symbol(&self, symbol: &str, epoch: u64) {
        let symbol = symbol.to_ascii_lowercase();
        let raised = {
            let mut target = self.shared.target.write();
            target.symbol.clone_from(&symbol);
            target.epoch = epoch;
            if let Some(close) = target.close.take() {
                close.notify_one();
            }
            self.shared.restart.raise()
        };

        info!(%symbol, epoch, coalesced = !raised, "Switching feed symbol");
    }

    /// Runs the connect/stream/retry loop until the price consumer goes away.
    async fn run(self) {
        loop {
            let (symbol, epoch) = {
                let target = self.shared.target.read();
                (target.symbol.clone(), target.epoch)
            };
            let url = stream_url(&self.shared.base_url, &symbol);

            self.set_state(ConnectionState::Connecting);
            info!(%url, "Connecting to trade stream");

            let stream = match self.shared.connector.connect(&url).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(
                        error = %e,
                        retry_secs = DIAL_RETRY_DELAY.as_secs(),
                        "Feed connection failed, retrying"
                    );
                    self.set_state(ConnectionState::Disconnected);
                    tokio::time::sleep(DIAL_RETRY_DELAY).await;
                    continue;
                }
            };

            let Some(close) = self.register_connection(&symbol, epoch) else {
                info!(dialed = %symbol, "Symbol changed while connecting, redialing");
                self.set_state(ConnectionState::Restarting);
                continue;
            };

            self.set_state(ConnectionState::Streaming);
            info!(%symbol, "Streaming trades");

            let reason = self.read_loop(stream, &symbol, epoch, &close).await;

            {
                let mut target = self.shared.target.write();
                if target.close.as_ref().is_some_and(|c| Arc::ptr_eq(c, &close)) {
                    target.close = None;
                }
            }

            if reason == DisconnectReason::Shutdown {
                info!("Price consumer closed, feed client stopping");
                self.set_state(ConnectionState::Disconnected);
                return;
            }

            self.set_state(ConnectionState::Restarting);

            if self.shared.restart.take() {
                info!(?reason, "Reconnecting with new symbol");
            } else {
                warn!(
                    ?reason,
                    retry_secs = STREAM_RETRY_DELAY.as_secs(),
                    "Connection lost, reconnecting"
                );
                tokio::time::sleep(STREAM_RETRY_DELAY).await;
            }
        }
    }

    /// Installs a close handle for a fresh connection to `symbol`.
    ///
    /// Returns `None` if the target moved on while dialing, even back to the
    /// same symbol. A pending restart is consumed either way: the next dial
    /// serves it.
    fn register_connection(&self, symbol: &str, epoch: u64) -> Option<Arc<Notify>> {
        let mut target = self.shared.target.write();
        self.shared.restart.take();
        if target.epoch != epoch || target.symbol != symbol {
            return None;
        }
        let close = Arc::new(Notify::new());
        target.close = Some(Arc::clone(&close));
        Some(close)
    }

    /// Forwards decoded trades until the connection ends or is closed.
    async fn read_loop(
        &self,
        mut stream: FeedStream,
        symbol: &str,
        epoch: u64,
        close: &Notify,
    ) -> DisconnectReason {
        loop {
            tokio::select! {
                biased;

                () = close.notified() => return DisconnectReason::Closed,

                frame = stream.next() => match frame {
                    Some(Ok(text)) => match decode_trade(&text, symbol, epoch) {
                        Ok(update) => {
                            if self.shared.output.send(update).await.is_err() {
                                return DisconnectReason::Shutdown;
                            }
                        }
                        Err(e) => debug!(error = %e, "Dropping malformed trade payload"),
                    },
                    Some(Err(e)) => {
                        warn!(error = %e, "Trade stream error");
                        return DisconnectReason::StreamError;
                    }
                    None => {
                        warn!("Trade stream ended");
                        return DisconnectReason::Ended;
                    }
                },
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.shared.state.send_replace(state);
        if previous != state {
            debug!(from = ?previous, to = ?state, "Feed state transition");
        }
    }
}
