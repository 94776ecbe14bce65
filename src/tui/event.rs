//! Event handling for the dashboard.
//!
//! [`update`] is the only place application state changes. It never performs
//! I/O: anything that needs the network comes back as an [`Action`] for the
//! runner to execute, and the result re-enters as a [`Message`].

use std::time::Duration;

use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::debug;

use super::app::{App, DashboardSnapshot, PollData, StartMode, ViewMode};
use crate::models::api::{CoinInfo, HistoryTrade, SymbolResponse};

/// Events that can occur in the application.
#[derive(Debug)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// Terminal was resized.
    Resize(u16, u16),
    /// Periodic tick, also the poll timer.
    Tick,
}

/// Messages that update application state.
#[derive(Debug)]
pub enum Message {
    /// Input event from terminal.
    Input(Event),

    /// A poll finished. Failures carry the text to show in place of data.
    Polled {
        generation: u64,
        result: Result<PollData, String>,
    },
    /// Coin catalog fetched.
    CoinsLoaded(Result<Vec<CoinInfo>, String>),
    /// Persisted trade history fetched.
    HistoryLoaded(Result<Vec<HistoryTrade>, String>),
    /// The server answered a swap request.
    SymbolChanged(Result<SymbolResponse, String>),

    /// Request to quit the application.
    Quit,
}

/// Side effects requested by [`update`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Fetch symbol, price and stats, tagged with the swap generation.
    Poll { generation: u64 },
    /// Fetch the coin catalog.
    FetchCoins,
    /// Fetch persisted trades for the active symbol.
    FetchHistory,
    /// Ask the server to track another symbol.
    ChangeSymbol(String),
}

/// Spawns a task that polls for terminal events and sends them to a channel.
pub fn spawn_event_reader(tx: mpsc::UnboundedSender<Message>) {
    tokio::spawn(async move {
        loop {
            match tokio::task::spawn_blocking(|| {
                if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            })
            .await
            {
                Ok(Some(CrosstermEvent::Key(key))) => {
                    if tx.send(Message::Input(Event::Key(key))).is_err() {
                        break;
                    }
                }
                Ok(Some(CrosstermEvent::Resize(w, h))) => {
                    if tx.send(Message::Input(Event::Resize(w, h))).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });
}

/// Spawns a task that sends periodic tick events.
pub fn spawn_tick_timer(tx: mpsc::UnboundedSender<Message>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if tx.send(Message::Input(Event::Tick)).is_err() {
                break;
            }
        }
    });
}

/// Actions to run once at startup, according to [`App::start`].
pub fn init(app: &mut App) -> Vec<Action> {
    match app.start.clone() {
        StartMode::Attach => request_poll(app).into_iter().collect(),
        StartMode::Select => vec![Action::FetchCoins],
        StartMode::Preselected(symbol) => vec![begin_switch(app, symbol)],
    }
}

/// Updates application state based on a message.
pub fn update(app: &mut App, message: Message) -> Vec<Action> {
    match message {
        Message::Input(event) => handle_input(app, event),
        Message::Polled { generation, result } => {
            apply_poll(app, generation, result);
            Vec::new()
        }
        Message::CoinsLoaded(result) => {
            apply_coins(app, result);
            Vec::new()
        }
        Message::HistoryLoaded(result) => {
            apply_history(app, result);
            Vec::new()
        }
        Message::SymbolChanged(result) => apply_symbol_change(app, result),
        Message::Quit => {
            app.should_quit = true;
            Vec::new()
        }
    }
}

/// Issues a poll unless one for the current generation is outstanding.
fn request_poll(app: &mut App) -> Option<Action> {
    if app.switching || app.poll_in_flight == Some(app.generation) {
        return None;
    }
    app.poll_in_flight = Some(app.generation);
    Some(Action::Poll {
        generation: app.generation,
    })
}

/// Enters the switching sub-state; every poll issued before this is stale.
fn begin_switch(app: &mut App, symbol: String) -> Action {
    app.switching = true;
    app.generation += 1;
    Action::ChangeSymbol(symbol)
}

fn apply_poll(app: &mut App, generation: u64, result: Result<PollData, String>) {
    if app.poll_in_flight == Some(generation) {
        app.poll_in_flight = None;
    }
    if generation != app.generation || app.switching {
        debug!(generation, current = app.generation, "Discarding stale poll");
        return;
    }

    match result {
        Ok(data) => {
            if data.price > Decimal::ZERO {
                app.history.push(&data.symbol.symbol, data.price);
            } else {
                app.history.retarget(&data.symbol.symbol);
            }
            app.snapshot = DashboardSnapshot::next(&app.snapshot, data);
        }
        Err(error) => app.snapshot = DashboardSnapshot::failed(error),
    }
}

fn apply_coins(app: &mut App, result: Result<Vec<CoinInfo>, String>) {
    if app.switching {
        return;
    }
    match result {
        Ok(coins) => {
            app.coins = coins;
            app.coin_cursor = app.current_coin_index().unwrap_or(0);
        }
        Err(error) => app.show_error(format!("Failed to load coins: {error}")),
    }
}

fn apply_history(app: &mut App, result: Result<Vec<HistoryTrade>, String>) {
    if app.mode != ViewMode::History {
        return;
    }
    match result {
        Ok(trades) => app.trades = trades,
        Err(error) => {
            app.trades.clear();
            app.show_error(format!("Failed to load history: {error}"));
        }
    }
    app.trades_loaded = true;
    app.history_scroll = app.history_scroll.min(app.max_history_scroll());
}

fn apply_symbol_change(app: &mut App, result: Result<SymbolResponse, String>) -> Vec<Action> {
    if !app.switching {
        return Vec::new();
    }
    app.switching = false;

    match result {
        Ok(symbol) => {
            app.history.clear();
            app.history.retarget(&symbol.symbol);
            app.snapshot = DashboardSnapshot {
                symbol: symbol.symbol,
                display_name: symbol.name,
                connected: true,
                ..DashboardSnapshot::default()
            };
            app.mode = ViewMode::Dashboard;
            request_poll(app).into_iter().collect()
        }
        Err(error) => {
            app.show_error(format!("Failed to switch coin: {error}"));
            Vec::new()
        }
    }
}

/// Handles input events and updates application state.
fn handle_input(app: &mut App, event: Event) -> Vec<Action> {
    match event {
        Event::Key(key) => handle_key(app, key),
        Event::Resize(_, _) => Vec::new(),
        Event::Tick => {
            app.clear_stale_errors();
            if app.mode == ViewMode::Dashboard {
                request_poll(app).into_iter().collect()
            } else {
                Vec::new()
            }
        }
    }
}

/// Handles key press events.
fn handle_key(app: &mut App, key: KeyEvent) -> Vec<Action> {
    if key.kind != KeyEventKind::Press {
        return Vec::new();
    }

    // Global keys (work in any mode)
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Vec::new();
    }

    // Nothing but quitting while a swap is outstanding
    if app.switching {
        return Vec::new();
    }

    match app.mode {
        ViewMode::Dashboard => handle_dashboard_keys(app, key),
        ViewMode::CoinSelect => handle_coin_select_keys(app, key),
        ViewMode::History => handle_history_keys(app, key),
    }
}

fn handle_dashboard_keys(app: &mut App, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            Vec::new()
        }
        KeyCode::Char('c') => {
            app.mode = ViewMode::CoinSelect;
            vec![Action::FetchCoins]
        }
        KeyCode::Char('h') => {
            app.mode = ViewMode::History;
            app.history_scroll = 0;
            app.trades_loaded = false;
            vec![Action::FetchHistory]
        }
        _ => Vec::new(),
    }
}

fn handle_coin_select_keys(app: &mut App, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Char('k') | KeyCode::Up => {
            app.coin_cursor = app.coin_cursor.saturating_sub(1);
            Vec::new()
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.coin_cursor + 1 < app.coins.len() {
                app.coin_cursor += 1;
            }
            Vec::new()
        }
        KeyCode::Enter | KeyCode::Char(' ') => match app.coins.get(app.coin_cursor) {
            Some(coin) => {
                let symbol = coin.symbol.clone();
                vec![begin_switch(app, symbol)]
            }
            None => Vec::new(),
        },
        KeyCode::Esc | KeyCode::Char('q') => {
            app.mode = ViewMode::Dashboard;
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn handle_history_keys(app: &mut App, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Char('k') | KeyCode::Up => {
            app.history_scroll = app.history_scroll.saturating_sub(1);
            Vec::new()
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.history_scroll < app.max_history_scroll() {
                app.history_scroll += 1;
            }
            Vec::new()
        }
        KeyCode::Char('r') => {
            app.trades_loaded = false;
            vec![Action::FetchHistory]
        }
        KeyCode::Esc | KeyCode::Char('q') => {
            app.mode = ViewMode::Dashboard;
            request_poll(app).into_iter().collect()
        }
        _ => Vec::new(),
    }
}
