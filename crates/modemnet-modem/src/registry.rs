//! Shared lookup of network instances
//!
//! Wireless networks are ambient per region and wired networks are named
//! segments. The registry only keeps weak handles: a network lives as long
//! as some modem (or the caller) holds it, and a later lookup of the same
//! name after it was dropped creates a fresh one.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use modemnet_core::PacketNetwork;
use modemnet_routing::{WiredNetwork, WirelessNetwork};
use tracing::debug;

/// Registry of wireless regions and wired segments
pub struct NetworkRegistry<P> {
    wireless: DashMap<String, Weak<WirelessNetwork<P>>>,
    wired: DashMap<String, Weak<WiredNetwork<P>>>,
}

impl<P: Send + Sync + 'static> NetworkRegistry<P> {
    pub fn new() -> Self {
        Self {
            wireless: DashMap::new(),
            wired: DashMap::new(),
        }
    }

    /// The wireless network of a region, created on first use
    pub fn wireless(&self, region: &str) -> Arc<WirelessNetwork<P>> {
        let mut entry = self.wireless.entry(region.to_string()).or_default();
        if let Some(network) = entry.upgrade() {
            return network;
        }
        let network = WirelessNetwork::shared();
        *entry = Arc::downgrade(&network);
        debug!(region, network = %network.id(), "Created wireless network");
        network
    }

    /// A named wired segment, created on first use
    pub fn wired(&self, segment: &str) -> Arc<WiredNetwork<P>> {
        let mut entry = self.wired.entry(segment.to_string()).or_default();
        if let Some(network) = entry.upgrade() {
            return network;
        }
        let network = WiredNetwork::shared();
        *entry = Arc::downgrade(&network);
        debug!(segment, network = %network.id(), "Created wired segment");
        network
    }

    /// Forget names whose network has been dropped
    pub fn prune(&self) -> usize {
        let before = self.len_raw();
        self.wireless.retain(|_, network| network.strong_count() > 0);
        self.wired.retain(|_, network| network.strong_count() > 0);
        before - self.len_raw()
    }

    /// Number of live networks
    pub fn len(&self) -> usize {
        let live_wireless = self.wireless.iter().filter(|e| e.strong_count() > 0).count();
        let live_wired = self.wired.iter().filter(|e| e.strong_count() > 0).count();
        live_wireless + live_wired
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every network. Existing handles keep working.
    pub fn reset(&self) {
        self.wireless.clear();
        self.wired.clear();
    }

    fn len_raw(&self) -> usize {
        self.wireless.len() + self.wired.len()
    }
}

impl<P: Send + Sync + 'static> Default for NetworkRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
