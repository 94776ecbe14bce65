//! Price statistics engine.
//!
//! The hub only talks to the [`StatsEngine`] trait, so the engine can be
//! swapped for another implementation (or a recording double in tests).
//! [`SessionStats`] is the engine the server runs with: a simple moving
//! average over the most recent samples plus the session high and low.

use std::collections::VecDeque;

use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::models::api::StatsResponse;

/// Number of samples in the moving-average window.
pub const MOVING_AVERAGE_WINDOW: usize = 20;

/// Aggregates price samples for the active symbol.
pub trait StatsEngine: Send + Sync {
    /// Records one price sample.
    fn add_sample(&self, price: Decimal);
    /// Mean of the samples in the current window, zero when empty.
    fn moving_average(&self) -> Decimal;
    /// Highest sample since the last reset, zero when empty.
    fn high(&self) -> Decimal;
    /// Lowest sample since the last reset, zero when empty.
    fn low(&self) -> Decimal;
    /// Discards every sample.
    fn reset(&self);

    /// Reads all three aggregates for the API.
    fn snapshot(&self) -> StatsResponse {
        StatsResponse {
            moving_average: self.moving_average(),
            high: self.high(),
            low: self.low(),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    window: VecDeque<Decimal>,
    sum: Decimal,
    high: Option<Decimal>,
    low: Option<Decimal>,
}

/// Moving average plus session high/low.
#[derive(Debug)]
pub struct SessionStats {
    capacity: usize,
    state: Mutex<SessionState>,
}

impl SessionStats {
    /// Creates an engine with the default window.
    pub fn new() -> Self {
        Self::with_window(MOVING_AVERAGE_WINDOW)
    }

    /// Creates an engine averaging over `capacity` samples (at least one).
    pub fn with_window(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(SessionState {
                window: VecDeque::with_capacity(capacity),
                ..SessionState::default()
            }),
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsEngine for SessionStats {
    fn add_sample(&self, price: Decimal) {
        let mut state = self.state.lock();
        if state.window.len() >= self.capacity
            && let Some(evicted) = state.window.pop_front()
        {
            state.sum -= evicted;
        }
        state.window.push_back(price);
        state.sum += price;
        state.high = Some(state.high.map_or(price, |h| h.max(price)));
        state.low = Some(state.low.map_or(price, |l| l.min(price)));
    }

    fn moving_average(&self) -> Decimal {
        let state = self.state.lock();
        if state.window.is_empty() {
            return Decimal::ZERO;
        }
        state.sum / Decimal::from(state.window.len())
    }

    fn high(&self) -> Decimal {
        self.state.lock().high.unwrap_or(Decimal::ZERO)
    }

    fn low(&self) -> Decimal {
        self.state.lock().low.unwrap_or(Decimal::ZERO)
    }

    fn reset(&self) {
        let mut state = self.state.lock();
        state.window.clear();
        state.sum = Decimal::ZERO;
        state.high = None;
        state.low = None;
    }
}
