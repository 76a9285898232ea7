//! Wireless broadcast engine
//!
//! A flat registry of receivers. Every transmission walks the whole
//! registry and decides per receiver from distance and dimension; there is
//! no topology to maintain.

use std::collections::HashMap;
use std::sync::Arc;

use modemnet_core::{
    DeviceId, NetworkId, NetworkKind, Packet, PacketNetwork, PacketReceiver, ReceiverRef,
    receiver_ref,
};
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::delivery::{Candidate, Route, fan_out};
use crate::stats::{NetworkStats, StatsSnapshot};

/// Range-based broadcast network
///
/// - Same-dimension transmissions reach receivers in the sender's dimension
///   whose distance from the sender is at most the given range (inclusive).
/// - Interdimensional transmissions reach every registered receiver.
/// - The sender never receives its own packet.
pub struct WirelessNetwork<P> {
    id: NetworkId,
    receivers: RwLock<HashMap<DeviceId, ReceiverRef<P>>>,
    stats: NetworkStats,
}

impl<P: Send + Sync + 'static> WirelessNetwork<P> {
    pub fn new() -> Self {
        Self::with_id(NetworkId::new())
    }

    pub fn with_id(id: NetworkId) -> Self {
        Self {
            id,
            receivers: RwLock::new(HashMap::new()),
            stats: NetworkStats::new(),
        }
    }

    /// Convenience for sharing the network between devices
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of registrations, including ones whose device is gone
    pub fn len(&self) -> usize {
        self.receivers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.read().is_empty()
    }

    /// Forget registrations whose device has been dropped
    pub fn prune_stale(&self) -> usize {
        let mut receivers = self.receivers.write();
        let before = receivers.len();
        receivers.retain(|_, handle| handle.strong_count() > 0);
        let pruned = before - receivers.len();
        if pruned > 0 {
            debug!(network = %self.id, pruned, "Pruned stale receivers");
        }
        pruned
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Copy out every registration except the sender's
    fn candidates(&self, sender: DeviceId) -> Vec<Candidate<P>> {
        self.receivers
            .read()
            .iter()
            .filter(|(device, _)| **device != sender)
            .map(|(device, handle)| (*device, handle.clone()))
            .collect()
    }
}

impl<P: Send + Sync + 'static> Default for WirelessNetwork<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Send + Sync + 'static> PacketNetwork<P> for WirelessNetwork<P> {
    fn id(&self) -> NetworkId {
        self.id
    }

    fn kind(&self) -> NetworkKind {
        NetworkKind::Wireless
    }

    fn add_receiver(&self, receiver: &Arc<dyn PacketReceiver<P>>) -> bool {
        let device = receiver.device_id();
        let mut receivers = self.receivers.write();
        if let Some(existing) = receivers.get(&device) {
            if existing.strong_count() > 0 {
                trace!(network = %self.id, device = %device, "Receiver already registered");
                return false;
            }
        }
        receivers.insert(device, receiver_ref(receiver));
        debug!(network = %self.id, device = %device, "Receiver added");
        true
    }

    fn remove_receiver(&self, device: DeviceId) -> bool {
        let removed = self.receivers.write().remove(&device).is_some();
        if removed {
            debug!(network = %self.id, device = %device, "Receiver removed");
        }
        removed
    }

    fn contains(&self, device: DeviceId) -> bool {
        self.receivers.read().contains_key(&device)
    }

    fn transmit_same_dimension(&self, packet: &Packet<P>, range: f64) {
        self.stats.record_transmission();
        if range.is_nan() || range <= 0.0 {
            trace!(network = %self.id, range, "Non-positive range, nothing to deliver");
            return;
        }

        let candidates = self.candidates(packet.sender().device);
        trace!(
            network = %self.id,
            sender = %packet.sender().device,
            channel = packet.channel(),
            range,
            candidates = candidates.len(),
            "Transmitting in dimension"
        );
        fan_out(
            self.id,
            &self.stats,
            candidates,
            packet,
            Route::SameDimension { range: Some(range) },
        );
    }

    fn transmit_interdimensional(&self, packet: &Packet<P>) {
        self.stats.record_transmission();

        let candidates = self.candidates(packet.sender().device);
        trace!(
            network = %self.id,
            sender = %packet.sender().device,
            channel = packet.channel(),
            candidates = candidates.len(),
            "Transmitting across dimensions"
        );
        fan_out(
            self.id,
            &self.stats,
            candidates,
            packet,
            Route::DifferentDimension,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modemnet_core::{DVec3, FaultMode, RecordingReceiver, SenderInfo};

    type Receiver = Arc<RecordingReceiver<&'static str>>;

    fn receiver(id: u64, x: f64, dimension: &str) -> Receiver {
        RecordingReceiver::new(DeviceId::new(id), DVec3::new(x, 0.0, 0.0), dimension)
    }

    fn packet_from(network: &WirelessNetwork<&'static str>, sender: &Receiver) -> Packet<&'static str> {
        Packet::new(SenderInfo::of(sender.as_ref()), 1, 2, "hello", network.id())
    }

    #[test]
    fn test_add_is_idempotent() {
        let network = WirelessNetwork::new();
        let a = receiver(1, 0.0, "overworld");
        let b = receiver(2, 1.0, "overworld");

        assert!(network.add_receiver(&b.as_dyn()));
        assert!(!network.add_receiver(&b.as_dyn()));
        network.add_receiver(&a.as_dyn());
        assert_eq!(network.len(), 2);

        network.transmit_same_dimension(&packet_from(&network, &a), 10.0);
        assert_eq!(b.count(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let network = WirelessNetwork::<&'static str>::new();
        let a = receiver(1, 0.0, "overworld");

        network.add_receiver(&a.as_dyn());
        assert!(network.remove_receiver(DeviceId::new(1)));
        assert!(!network.remove_receiver(DeviceId::new(1)));
        assert!(!network.remove_receiver(DeviceId::new(42)));
        assert!(network.is_empty());
    }

    #[test]
    fn test_range_is_inclusive() {
        let network = WirelessNetwork::new();
        let a = receiver(1, 0.0, "overworld");
        let b = receiver(2, 10.0, "overworld");
        network.add_receiver(&a.as_dyn());
        network.add_receiver(&b.as_dyn());

        network.transmit_same_dimension(&packet_from(&network, &a), 10.0);
        assert_eq!(b.count(), 1);
        assert_eq!(b.last().unwrap().distance(), Some(10.0));

        network.transmit_same_dimension(&packet_from(&network, &a), 10.0 - 1e-9);
        assert_eq!(b.count(), 1);
    }

    #[test]
    fn test_non_positive_range_reaches_nobody() {
        let network = WirelessNetwork::new();
        let a = receiver(1, 0.0, "overworld");
        let b = receiver(2, 0.0, "overworld");
        network.add_receiver(&a.as_dyn());
        network.add_receiver(&b.as_dyn());

        network.transmit_same_dimension(&packet_from(&network, &a), 0.0);
        network.transmit_same_dimension(&packet_from(&network, &a), -5.0);
        network.transmit_same_dimension(&packet_from(&network, &a), f64::NAN);
        assert_eq!(b.count(), 0);
        assert_eq!(network.stats().transmissions, 3);
    }

    #[test]
    fn test_nan_position_is_never_in_range() {
        let network = WirelessNetwork::new();
        let a = receiver(1, 0.0, "overworld");
        let lost = receiver(2, f64::NAN, "overworld");
        network.add_receiver(&a.as_dyn());
        network.add_receiver(&lost.as_dyn());

        network.transmit_same_dimension(&packet_from(&network, &a), 10.0);
        network.transmit_same_dimension(&packet_from(&network, &a), f64::INFINITY);
        assert_eq!(lost.count(), 0);

        network.transmit_interdimensional(&packet_from(&network, &a));
        assert_eq!(lost.count(), 1);
    }

    #[test]
    fn test_dimension_gating() {
        let network = WirelessNetwork::new();
        let a = receiver(1, 0.0, "overworld");
        let nether = receiver(2, 0.0, "nether");
        network.add_receiver(&a.as_dyn());
        network.add_receiver(&nether.as_dyn());

        network.transmit_same_dimension(&packet_from(&network, &a), f64::INFINITY);
        assert_eq!(nether.count(), 0);

        network.transmit_interdimensional(&packet_from(&network, &a));
        assert_eq!(nether.count(), 1);
        assert_eq!(nether.last().unwrap().distance(), None);
    }

    #[test]
    fn test_interdimensional_ignores_distance() {
        let network = WirelessNetwork::new();
        let a = receiver(1, 0.0, "overworld");
        let far = receiver(2, 1.0e9, "overworld");
        network.add_receiver(&a.as_dyn());
        network.add_receiver(&far.as_dyn());

        network.transmit_interdimensional(&packet_from(&network, &a));
        assert_eq!(far.count(), 1);
    }

    #[test]
    fn test_no_self_delivery() {
        let network = WirelessNetwork::new();
        let a = receiver(1, 0.0, "overworld");
        network.add_receiver(&a.as_dyn());

        network.transmit_same_dimension(&packet_from(&network, &a), 100.0);
        network.transmit_interdimensional(&packet_from(&network, &a));
        assert_eq!(a.count(), 0);
    }

    #[test]
    fn test_faulty_receiver_is_isolated() {
        let network = WirelessNetwork::new();
        let a = receiver(1, 0.0, "overworld");
        let failing = receiver(2, 1.0, "overworld");
        let panicking = receiver(3, 2.0, "overworld");
        let healthy = receiver(4, 3.0, "overworld");
        failing.set_fault(Some(FaultMode::Error));
        panicking.set_fault(Some(FaultMode::Panic));
        for r in [&a, &failing, &panicking, &healthy] {
            network.add_receiver(&r.as_dyn());
        }

        network.transmit_same_dimension(&packet_from(&network, &a), 10.0);

        assert_eq!(healthy.count(), 1);
        let stats = network.stats();
        assert_eq!(stats.deliveries, 1);
        assert_eq!(stats.faults, 2);
        assert_eq!(network.len(), 4);
    }

    #[test]
    fn test_dropped_receiver_is_skipped_and_pruned() {
        let network = WirelessNetwork::new();
        let a = receiver(1, 0.0, "overworld");
        network.add_receiver(&a.as_dyn());
        {
            let gone = receiver(2, 1.0, "overworld");
            network.add_receiver(&gone.as_dyn());
        }

        network.transmit_same_dimension(&packet_from(&network, &a), 10.0);
        assert_eq!(network.stats().stale, 1);

        assert_eq!(network.prune_stale(), 1);
        assert_eq!(network.len(), 1);
    }

    #[test]
    fn test_dead_registration_is_replaced() {
        let network = WirelessNetwork::<&'static str>::new();
        {
            let first = receiver(2, 1.0, "overworld");
            network.add_receiver(&first.as_dyn());
        }
        let second = receiver(2, 1.0, "overworld");
        assert!(network.add_receiver(&second.as_dyn()));
    }

    #[test]
    fn test_is_wireless() {
        let network = WirelessNetwork::<()>::new();
        assert!(network.is_wireless());
        assert_eq!(network.kind(), NetworkKind::Wireless);
    }
}
