//! The packet network abstraction
//!
//! Two implementations exist (wireless and wired, in `modemnet-routing`).
//! They share this contract and nothing else.

use std::sync::Arc;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::identity::{DeviceId, NetworkId};
use crate::packet::Packet;
use crate::receiver::PacketReceiver;

/// Which routing engine a network uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum NetworkKind {
    /// Delivery gated by distance and dimension
    #[display("wireless")]
    Wireless,
    /// Delivery gated by cable connectivity
    #[display("wired")]
    Wired,
}

/// A collection of receivers that packets can be transmitted across
///
/// Mutators return whether anything changed. Invalid operations (adding a
/// receiver twice, removing a stranger) are no-ops, never errors.
/// Transmission is synchronous and reports nothing back to the sender.
pub trait PacketNetwork<P>: Send + Sync {
    /// Identity stamped on packets submitted through this network
    fn id(&self) -> NetworkId;

    fn kind(&self) -> NetworkKind;

    fn is_wireless(&self) -> bool {
        self.kind() == NetworkKind::Wireless
    }

    /// Register a receiver. The network keeps a non-owning reference.
    fn add_receiver(&self, receiver: &Arc<dyn PacketReceiver<P>>) -> bool;

    /// Unregister a receiver
    fn remove_receiver(&self, device: DeviceId) -> bool;

    /// Check whether a device is currently registered
    fn contains(&self, device: DeviceId) -> bool;

    /// Send a packet to receivers reachable without crossing dimensions
    ///
    /// `range` is the sender's transmission range. Networks that do not
    /// route by distance accept and ignore it.
    fn transmit_same_dimension(&self, packet: &Packet<P>, range: f64);

    /// Send a packet to every reachable receiver, in any dimension
    fn transmit_interdimensional(&self, packet: &Packet<P>);
}
