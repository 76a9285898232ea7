//! Recording receiver for testing
//!
//! Provides an in-memory [`PacketReceiver`] that remembers every delivery,
//! so routing logic can be checked without a real device behind it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use modemnet_core::{DeviceId, DVec3, RecordingReceiver};
//!
//! let receiver = RecordingReceiver::<&str>::new(DeviceId::new(2), DVec3::ZERO, "overworld");
//! network.add_receiver(&receiver.as_dyn());
//! network.transmit_same_dimension(&packet, 64.0);
//! assert_eq!(receiver.count(), 1);
//! ```

use std::sync::Arc;

use glam::DVec3;
use parking_lot::{Mutex, RwLock};

use crate::error::DeliveryError;
use crate::identity::{DeviceId, DimensionId, Location};
use crate::packet::Packet;
use crate::receiver::PacketReceiver;

/// A delivery observed by a [`RecordingReceiver`]
#[derive(Debug, Clone)]
pub enum Delivery<P> {
    SameDimension { packet: Packet<P>, distance: f64 },
    DifferentDimension { packet: Packet<P> },
}

impl<P> Delivery<P> {
    pub fn packet(&self) -> &Packet<P> {
        match self {
            Delivery::SameDimension { packet, .. } => packet,
            Delivery::DifferentDimension { packet } => packet,
        }
    }

    /// Distance reported with the delivery (`None` across dimensions)
    pub fn distance(&self) -> Option<f64> {
        match self {
            Delivery::SameDimension { distance, .. } => Some(*distance),
            Delivery::DifferentDimension { .. } => None,
        }
    }
}

/// How a [`RecordingReceiver`] misbehaves when asked to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    /// Return a [`DeliveryError`]
    Error,
    /// Panic inside the callback
    Panic,
}

/// A receiver that records what it is given
pub struct RecordingReceiver<P> {
    device: DeviceId,
    location: RwLock<Location>,
    deliveries: Mutex<Vec<Delivery<P>>>,
    fault: Mutex<Option<FaultMode>>,
}

impl<P: Clone + Send + Sync + 'static> RecordingReceiver<P> {
    pub fn new(device: DeviceId, position: DVec3, dimension: impl Into<DimensionId>) -> Arc<Self> {
        Arc::new(Self {
            device,
            location: RwLock::new(Location::new(position, dimension)),
            deliveries: Mutex::new(Vec::new()),
            fault: Mutex::new(None),
        })
    }

    /// Get this receiver as the trait object networks register
    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn PacketReceiver<P>> {
        self.clone()
    }

    pub fn move_to(&self, position: DVec3, dimension: impl Into<DimensionId>) {
        *self.location.write() = Location::new(position, dimension);
    }

    /// Make every following delivery fail (or stop failing with `None`)
    pub fn set_fault(&self, fault: Option<FaultMode>) {
        *self.fault.lock() = fault;
    }

    pub fn deliveries(&self) -> Vec<Delivery<P>> {
        self.deliveries.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.deliveries.lock().len()
    }

    /// Number of deliveries whose packet came from `sender`
    pub fn count_from(&self, sender: DeviceId) -> usize {
        self.deliveries
            .lock()
            .iter()
            .filter(|d| d.packet().is_from(sender))
            .count()
    }

    pub fn last(&self) -> Option<Delivery<P>> {
        self.deliveries.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.deliveries.lock().clear();
    }

    fn record(&self, delivery: Delivery<P>) -> Result<(), DeliveryError> {
        // Copy the mode out so the panic does not poison anything we hold
        let fault = *self.fault.lock();
        match fault {
            Some(FaultMode::Error) => Err(DeliveryError::Rejected(format!(
                "receiver {} is failing on purpose",
                self.device
            ))),
            Some(FaultMode::Panic) => panic!("receiver {} panicked on purpose", self.device),
            None => {
                self.deliveries.lock().push(delivery);
                Ok(())
            }
        }
    }
}

impl<P: Clone + Send + Sync + 'static> PacketReceiver<P> for RecordingReceiver<P> {
    fn device_id(&self) -> DeviceId {
        self.device
    }

    fn position(&self) -> DVec3 {
        self.location.read().position
    }

    fn dimension(&self) -> DimensionId {
        self.location.read().dimension.clone()
    }

    fn receive_same_dimension(
        &self,
        packet: &Packet<P>,
        distance: f64,
    ) -> Result<(), DeliveryError> {
        self.record(Delivery::SameDimension {
            packet: packet.clone(),
            distance,
        })
    }

    fn receive_different_dimension(&self, packet: &Packet<P>) -> Result<(), DeliveryError> {
        self.record(Delivery::DifferentDimension {
            packet: packet.clone(),
        })
    }
}
