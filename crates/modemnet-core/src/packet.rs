//! Packet envelope routed by packet networks

use glam::DVec3;

use crate::identity::{DeviceId, DimensionId, Location, NetworkId};
use crate::receiver::PacketReceiver;

/// Where a packet was sent from
///
/// Captured when the packet is built, so a device that moves while the
/// packet is in flight does not change the distances a network computes.
#[derive(Debug, Clone, PartialEq)]
pub struct SenderInfo {
    /// The sending device
    pub device: DeviceId,
    /// Position at send time
    pub position: DVec3,
    /// Dimension at send time
    pub dimension: DimensionId,
}

impl SenderInfo {
    pub fn new(device: DeviceId, position: DVec3, dimension: impl Into<DimensionId>) -> Self {
        Self {
            device,
            position,
            dimension: dimension.into(),
        }
    }

    /// Snapshot a receiver's current location as a sender
    pub fn of<P, R: PacketReceiver<P> + ?Sized>(receiver: &R) -> Self {
        Self {
            device: receiver.device_id(),
            position: receiver.position(),
            dimension: receiver.dimension(),
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.position, self.dimension.clone())
    }
}

/// A packet submitted to a network
///
/// Fields are private: a packet cannot change once built. The network
/// borrows it for the duration of a transmit call and keeps nothing.
#[derive(Debug, Clone)]
pub struct Packet<P> {
    sender: SenderInfo,
    channel: i32,
    reply_channel: i32,
    payload: P,
    source_network: NetworkId,
}

impl<P> Packet<P> {
    /// Create a new packet
    pub fn new(
        sender: SenderInfo,
        channel: i32,
        reply_channel: i32,
        payload: P,
        source_network: NetworkId,
    ) -> Self {
        Self {
            sender,
            channel,
            reply_channel,
            payload,
            source_network,
        }
    }

    pub fn sender(&self) -> &SenderInfo {
        &self.sender
    }

    pub fn channel(&self) -> i32 {
        self.channel
    }

    pub fn reply_channel(&self) -> i32 {
        self.reply_channel
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// The network this packet was submitted through
    pub fn source_network(&self) -> NetworkId {
        self.source_network
    }

    /// Check whether this packet was sent by the given device
    pub fn is_from(&self, device: DeviceId) -> bool {
        self.sender.device == device
    }
}
