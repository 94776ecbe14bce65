//! Application state for the dashboard.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::models::api::{CoinInfo, HistoryTrade, StatsResponse, SymbolResponse};

/// Maximum number of prices kept for the sparkline.
pub const HISTORY_RING_CAPACITY: usize = 20;

/// Rows of persisted trades visible at once in the history view.
pub const HISTORY_PAGE_SIZE: usize = 15;

/// Delay between polls while the dashboard view is active.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How long an error stays on the status line.
const ERROR_DISPLAY_TIME: Duration = Duration::from_secs(5);

/// Which screen is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Dashboard,
    CoinSelect,
    History,
}

/// How the dashboard begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartMode {
    /// Show whatever the server is tracking.
    Attach,
    /// Ask the server to switch to this symbol first.
    Preselected(String),
    /// Open the coin selector.
    Select,
}

/// Everything one successful poll returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollData {
    pub symbol: SymbolResponse,
    pub price: Decimal,
    pub stats: StatsResponse,
}

/// The dashboard's view of one poll cycle.
///
/// Replaced wholesale on every poll; an error snapshot carries no market
/// data at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DashboardSnapshot {
    pub symbol: String,
    pub display_name: String,
    pub price: Decimal,
    pub prev_price: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub moving_average: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub connected: bool,
    pub error: Option<String>,
}

impl DashboardSnapshot {
    /// Builds the snapshot that follows `prev` for freshly polled data.
    ///
    /// Change is only reported when both prices are positive and the symbol
    /// did not move between the two readings.
    pub fn next(prev: &DashboardSnapshot, data: PollData) -> Self {
        let same_symbol = prev.symbol == data.symbol.symbol;
        let (change, change_percent) =
            if same_symbol && prev.price > Decimal::ZERO && data.price > Decimal::ZERO {
                let change = data.price - prev.price;
                (change, change / prev.price * Decimal::ONE_HUNDRED)
            } else {
                (Decimal::ZERO, Decimal::ZERO)
            };

        Self {
            symbol: data.symbol.symbol,
            display_name: data.symbol.name,
            price: data.price,
            prev_price: prev.price,
            high: data.stats.high,
            low: data.stats.low,
            moving_average: data.stats.moving_average,
            change,
            change_percent,
            connected: true,
            error: None,
        }
    }

    /// A snapshot that only reports a failed poll stage.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Recent prices for exactly one symbol.
#[derive(Clone, Debug, Default)]
pub struct HistoryRing {
    symbol: Option<String>,
    prices: VecDeque<Decimal>,
}

impl HistoryRing {
    pub fn new() -> Self {
        Self {
            symbol: None,
            prices: VecDeque::with_capacity(HISTORY_RING_CAPACITY + 1),
        }
    }

    /// Switches the ring to `symbol`, dropping prices of any other symbol.
    pub fn retarget(&mut self, symbol: &str) {
        if self.symbol.as_deref() != Some(symbol) {
            self.prices.clear();
            self.symbol = Some(symbol.to_string());
        }
    }

    /// Appends a price for `symbol`, evicting the oldest past capacity.
    pub fn push(&mut self, symbol: &str, price: Decimal) {
        self.retarget(symbol);
        self.prices.push_back(price);
        if self.prices.len() > HISTORY_RING_CAPACITY {
            self.prices.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.prices.clear();
        self.symbol = None;
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn prices(&self) -> &VecDeque<Decimal> {
        &self.prices
    }

    /// Prices as floats for plotting.
    pub fn values(&self) -> Vec<f64> {
        self.prices.iter().filter_map(|p| p.to_f64()).collect()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Central application state container.
pub struct App {
    // -- View State --
    pub mode: ViewMode,
    /// A swap request is outstanding.
    pub switching: bool,

    // -- Market Data --
    pub snapshot: DashboardSnapshot,
    pub history: HistoryRing,

    // -- Coin Selector --
    pub coins: Vec<CoinInfo>,
    pub coin_cursor: usize,

    // -- Persisted History --
    pub trades: Vec<HistoryTrade>,
    pub trades_loaded: bool,
    pub history_scroll: usize,

    // -- Polling --
    /// Bumped on every swap; polls from an older generation are stale.
    pub generation: u64,
    /// Generation of the poll currently awaiting an answer.
    pub poll_in_flight: Option<u64>,

    /// Error message to display (clears after timeout).
    pub error_message: Option<ErrorDisplay>,
    pub start: StartMode,
    pub should_quit: bool,
}

impl App {
    pub fn new(start: StartMode) -> Self {
        let mode = match start {
            StartMode::Select => ViewMode::CoinSelect,
            StartMode::Attach | StartMode::Preselected(_) => ViewMode::Dashboard,
        };
        Self {
            mode,
            switching: false,
            snapshot: DashboardSnapshot::default(),
            history: HistoryRing::new(),
            coins: Vec::new(),
            coin_cursor: 0,
            trades: Vec::new(),
            trades_loaded: false,
            history_scroll: 0,
            generation: 0,
            poll_in_flight: None,
            error_message: None,
            start,
            should_quit: false,
        }
    }

    /// Largest valid history scroll offset.
    pub fn max_history_scroll(&self) -> usize {
        self.trades.len().saturating_sub(HISTORY_PAGE_SIZE)
    }

    /// Index of the active symbol in the coin list, if listed.
    pub fn current_coin_index(&self) -> Option<usize> {
        self.coins
            .iter()
            .position(|coin| coin.symbol == self.snapshot.symbol)
    }

    /// Sets an error message to display.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(ErrorDisplay {
            message: message.into(),
            timestamp: Instant::now(),
        });
    }

    /// Clears error messages older than five seconds.
    pub fn clear_stale_errors(&mut self) {
        if let Some(ref error) = self.error_message
            && error.timestamp.elapsed() > ERROR_DISPLAY_TIME
        {
            self.error_message = None;
        }
    }
}

/// Error message with timestamp for auto-clear.
#[derive(Clone, Debug)]
pub struct ErrorDisplay {
    pub message: String,
    pub timestamp: Instant,
}
