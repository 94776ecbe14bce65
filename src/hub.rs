//! Price hub: the single owner of the current price and the fan-out point
//! for live updates.
//!
//! The stored price and the subscriber set sit behind separate locks, so
//! API readers, subscriber churn and the ingest path never contend on one
//! global lock. Delivery to a sink is a non-blocking hand-off; a sink that
//! refuses one update, because it is closed or its buffer is full, is
//! dropped for good.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::models::PriceUpdate;
use crate::stats::StatsEngine;

/// A broadcast target.
pub trait PriceSink: Send + Sync {
    /// Hands one update to the sink. `false` means the sink is dead.
    fn deliver(&self, update: &PriceUpdate) -> bool;
}

impl PriceSink for mpsc::Sender<PriceUpdate> {
    fn deliver(&self, update: &PriceUpdate) -> bool {
        self.try_send(update.clone()).is_ok()
    }
}

/// Identifies one registration with the hub.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct Subscriber {
    id: SubscriberId,
    sink: Box<dyn PriceSink>,
}

/// Holds the latest price and broadcasts every update.
pub struct PriceHub {
    price: RwLock<Option<Decimal>>,
    stats: Arc<dyn StatsEngine>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl PriceHub {
    pub fn new(stats: Arc<dyn StatsEngine>) -> Self {
        Self {
            price: RwLock::new(None),
            stats,
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Records `update`, feeds the statistics engine, then broadcasts.
    pub fn update_price(&self, update: &PriceUpdate) {
        *self.price.write() = Some(update.price);
        self.stats.add_sample(update.price);
        self.broadcast(update);
    }

    /// The last recorded price, or `None` after a reset.
    pub fn current_price(&self) -> Option<Decimal> {
        *self.price.read()
    }

    /// Clears the stored price. Only the swap coordinator calls this.
    pub fn reset(&self) {
        *self.price.write() = None;
    }

    /// Registers `sink` for every future update.
    pub fn subscribe(&self, sink: impl PriceSink + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let count = {
            let mut subscribers = self.subscribers.lock();
            subscribers.push(Subscriber {
                id,
                sink: Box::new(sink),
            });
            subscribers.len()
        };
        info!(subscriber = id.0, total = count, "Subscriber registered");
        id
    }

    /// Removes a registration. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let (removed, count) = {
            let mut subscribers = self.subscribers.lock();
            let before = subscribers.len();
            subscribers.retain(|s| s.id != id);
            (subscribers.len() != before, subscribers.len())
        };
        if removed {
            info!(subscriber = id.0, total = count, "Subscriber removed");
        }
        removed
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// One delivery attempt per sink, in registration order.
    fn broadcast(&self, update: &PriceUpdate) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|subscriber| {
            let delivered = subscriber.sink.deliver(update);
            if !delivered {
                debug!(subscriber = subscriber.id.0, "Delivery failed, dropping subscriber");
            }
            delivered
        });
    }
}
