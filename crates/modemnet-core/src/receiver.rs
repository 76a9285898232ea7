//! Receiver capability
//!
//! Anything that can be handed a packet implements [`PacketReceiver`].
//! Range is deliberately absent: it belongs to the transmit call, not to
//! the receiving end.

use std::sync::{Arc, Weak};

use glam::DVec3;

use crate::error::DeliveryError;
use crate::identity::{DeviceId, DimensionId, Location};
use crate::packet::Packet;

/// Endpoint contract for packet delivery
///
/// Networks only ever hold a [`Weak`] reference to a receiver. The owning
/// device must call `remove_receiver` when it goes away.
pub trait PacketReceiver<P>: Send + Sync {
    /// Identity used for membership and self-delivery checks
    fn device_id(&self) -> DeviceId;

    /// Current position in the world
    fn position(&self) -> DVec3;

    /// Current dimension
    fn dimension(&self) -> DimensionId;

    /// Deliver a packet sent from the same dimension
    ///
    /// `distance` is the distance between sender and receiver for this
    /// delivery.
    fn receive_same_dimension(&self, packet: &Packet<P>, distance: f64)
    -> Result<(), DeliveryError>;

    /// Deliver a packet sent from another dimension (or interdimensionally)
    fn receive_different_dimension(&self, packet: &Packet<P>) -> Result<(), DeliveryError>;

    fn location(&self) -> Location {
        Location::new(self.position(), self.dimension())
    }
}

/// Non-owning handle to a registered receiver
pub type ReceiverRef<P> = Weak<dyn PacketReceiver<P>>;

/// Downgrade a receiver into the handle a network stores
pub fn receiver_ref<P: 'static>(receiver: &Arc<dyn PacketReceiver<P>>) -> ReceiverRef<P> {
    Arc::downgrade(receiver)
}
