//! Lock-free queue lifecycle state with in-flight tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

/// Lifecycle state of an [`InvocationQueue`](super::InvocationQueue).
///
/// State machine: Stopped -> Running -> Stopping -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// No worker. Enqueued requests are buffered until the next start.
    Stopped,
    /// The worker is pulling requests.
    Running,
    /// Stop was requested; the worker is finishing its current unit of work.
    Stopping,
}

/// Shared between the queue handle and its worker.
#[derive(Debug)]
pub(crate) struct QueueStatus {
    state: ArcSwap<QueueState>,
    in_flight: Arc<AtomicU64>,
}

impl QueueStatus {
    pub(crate) fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(QueueState::Stopped),
            in_flight: Arc::new(AtomicU64::new(0)),
        }
    }

    pub(crate) fn state(&self) -> QueueState {
        **self.state.load()
    }

    pub(crate) fn set(&self, state: QueueState) {
        self.state.store(Arc::new(state));
    }

    /// Tracks one executing unit of work until the guard drops, including
    /// when the unit panics.
    pub(crate) fn in_flight_guard(&self) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    pub(crate) fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }
}

/// Decrements the in-flight counter when dropped.
#[derive(Debug)]
pub(crate) struct InFlightGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
