//! Wired connectivity engine
//!
//! Devices joined by cables form a graph. A packet reaches the other
//! members of the sender's connected component; distance and range play no
//! part. Same-dimension packets only reach members in the sender's
//! dimension, interdimensional ones reach the whole component. Connectivity is kept by a [`ComponentGraph`], which merges
//! components eagerly on connect and re-walks only the affected component
//! after a disconnect.

use std::collections::HashMap;
use std::sync::Arc;

use modemnet_core::{
    DeviceId, NetworkId, NetworkKind, Packet, PacketNetwork, PacketReceiver, ReceiverRef,
    receiver_ref,
};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::components::{ComponentGraph, ComponentId};
use crate::delivery::{Candidate, Route, fan_out};
use crate::stats::{NetworkStats, StatsSnapshot};

/// Graph and receiver handles, always updated together
struct WiredState<P> {
    graph: ComponentGraph<DeviceId>,
    receivers: HashMap<DeviceId, ReceiverRef<P>>,
}

/// Cable network routed by connected components
pub struct WiredNetwork<P> {
    id: NetworkId,
    state: Mutex<WiredState<P>>,
    stats: NetworkStats,
}

impl<P: Send + Sync + 'static> WiredNetwork<P> {
    pub fn new() -> Self {
        Self::with_id(NetworkId::new())
    }

    pub fn with_id(id: NetworkId) -> Self {
        Self {
            id,
            state: Mutex::new(WiredState {
                graph: ComponentGraph::new(),
                receivers: HashMap::new(),
            }),
            stats: NetworkStats::new(),
        }
    }

    /// Convenience for sharing the network between devices
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Lay a cable between two registered devices
    ///
    /// Connecting already-connected devices, a device to itself, or a device
    /// that is not registered does nothing.
    pub fn connect(&self, a: DeviceId, b: DeviceId) -> bool {
        let connected = self.state.lock().graph.connect(a, b);
        if connected {
            debug!(network = %self.id, a = %a, b = %b, "Cable connected");
        } else {
            trace!(network = %self.id, a = %a, b = %b, "Connect ignored");
        }
        connected
    }

    /// Cut the cable between two devices. Missing cables are ignored.
    pub fn disconnect(&self, a: DeviceId, b: DeviceId) -> bool {
        let disconnected = self.state.lock().graph.disconnect(a, b);
        if disconnected {
            debug!(network = %self.id, a = %a, b = %b, "Cable disconnected");
        } else {
            trace!(network = %self.id, a = %a, b = %b, "Disconnect ignored");
        }
        disconnected
    }

    pub fn has_cable(&self, a: DeviceId, b: DeviceId) -> bool {
        self.state.lock().graph.has_edge(a, b)
    }

    /// Whether a packet from `a` would currently reach `b`
    pub fn are_connected(&self, a: DeviceId, b: DeviceId) -> bool {
        self.state.lock().graph.are_connected(a, b)
    }

    pub fn component_of(&self, device: DeviceId) -> Option<ComponentId> {
        self.state.lock().graph.component_of(device)
    }

    /// Every device in the same component as `device`, including itself
    pub fn component_members(&self, device: DeviceId) -> Vec<DeviceId> {
        self.state.lock().graph.members(device)
    }

    pub fn neighbours(&self, device: DeviceId) -> Vec<DeviceId> {
        self.state.lock().graph.neighbours(device)
    }

    pub fn component_count(&self) -> usize {
        self.state.lock().graph.component_count()
    }

    pub fn edge_count(&self) -> usize {
        self.state.lock().graph.edge_count()
    }

    pub fn len(&self) -> usize {
        self.state.lock().graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Copy out the sender's component, minus the sender
    fn candidates(&self, sender: DeviceId) -> Option<Vec<Candidate<P>>> {
        let mut state = self.state.lock();
        if !state.graph.contains(sender) {
            return None;
        }
        let members = state.graph.members(sender);
        Some(
            members
                .into_iter()
                .filter(|device| *device != sender)
                .filter_map(|device| {
                    state
                        .receivers
                        .get(&device)
                        .map(|handle| (device, handle.clone()))
                })
                .collect(),
        )
    }

    fn transmit(&self, packet: &Packet<P>, route: Route) {
        self.stats.record_transmission();

        let sender = packet.sender().device;
        let Some(candidates) = self.candidates(sender) else {
            debug!(network = %self.id, sender = %sender, "Sender is not on this network, dropping packet");
            return;
        };
        trace!(
            network = %self.id,
            sender = %sender,
            channel = packet.channel(),
            candidates = candidates.len(),
            "Transmitting over cable"
        );
        fan_out(self.id, &self.stats, candidates, packet, route);
    }
}

impl<P: Send + Sync + 'static> Default for WiredNetwork<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Send + Sync + 'static> PacketNetwork<P> for WiredNetwork<P> {
    fn id(&self) -> NetworkId {
        self.id
    }

    fn kind(&self) -> NetworkKind {
        NetworkKind::Wired
    }

    fn add_receiver(&self, receiver: &Arc<dyn PacketReceiver<P>>) -> bool {
        let device = receiver.device_id();
        let mut state = self.state.lock();
        if let Some(existing) = state.receivers.get(&device) {
            if existing.strong_count() > 0 {
                trace!(network = %self.id, device = %device, "Receiver already registered");
                return false;
            }
        }
        // A dead handle is swapped out but the node keeps its cables
        state.receivers.insert(device, receiver_ref(receiver));
        state.graph.insert_node(device);
        debug!(network = %self.id, device = %device, "Receiver added");
        true
    }

    fn remove_receiver(&self, device: DeviceId) -> bool {
        let mut state = self.state.lock();
        state.receivers.remove(&device);
        let removed = state.graph.remove_node(device);
        if removed {
            debug!(network = %self.id, device = %device, "Receiver removed");
        }
        removed
    }

    fn contains(&self, device: DeviceId) -> bool {
        self.state.lock().graph.contains(device)
    }

    /// `range` is ignored: cables carry a packet any distance, but only
    /// members in the sender's dimension hear it
    fn transmit_same_dimension(&self, packet: &Packet<P>, _range: f64) {
        self.transmit(packet, Route::SameDimension { range: None });
    }

    fn transmit_interdimensional(&self, packet: &Packet<P>) {
        self.transmit(packet, Route::DifferentDimension);
    }
}
