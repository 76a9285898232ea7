//! Per-network delivery counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Running counters kept by every network
#[derive(Debug, Default)]
pub struct NetworkStats {
    transmissions: AtomicU64,
    deliveries: AtomicU64,
    faults: AtomicU64,
    stale: AtomicU64,
}

/// Point-in-time copy of [`NetworkStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Transmit calls made on the network
    pub transmissions: u64,
    /// Callbacks that returned successfully
    pub deliveries: u64,
    /// Callbacks that returned an error or panicked
    pub faults: u64,
    /// Registered receivers skipped because their device was already gone
    pub stale: u64,
}

impl NetworkStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_transmission(&self) {
        self.transmissions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            transmissions: self.transmissions.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
        }
    }
}
