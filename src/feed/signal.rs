//! Single-slot restart notification.

use std::sync::atomic::{AtomicBool, Ordering};

/// A flag that is either pending or not.
///
/// Raising never blocks and never stacks: a second raise while one is
/// pending is absorbed. The consumer drains at most one pending signal per
/// [`take`](Self::take).
#[derive(Debug, Default)]
pub struct RestartSignal {
    pending: AtomicBool,
}

impl RestartSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a restart as pending. Returns `false` if one already was.
    pub fn raise(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }

    /// Consumes the pending restart, returning whether there was one.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}
