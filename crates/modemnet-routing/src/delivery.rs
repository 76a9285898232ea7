//! Fan-out of a packet to a snapshot of receivers
//!
//! Both engines build a candidate list under their lock, release it, then
//! hand the list to [`fan_out`]. Receivers may therefore call back into the
//! same network from inside a delivery.

use std::panic::{self, AssertUnwindSafe};

use modemnet_core::{DeliveryError, DeviceId, NetworkId, Packet, ReceiverRef};
use tracing::{trace, warn};

use crate::stats::NetworkStats;

/// A registered receiver picked for a transmission
pub(crate) type Candidate<P> = (DeviceId, ReceiverRef<P>);

/// Which callback a candidate gets
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Route {
    /// Delivery within the sender's dimension, further gated by `range` if any
    SameDimension { range: Option<f64> },
    /// Cross-dimension delivery, no gating
    DifferentDimension,
}

/// Deliver `packet` to each candidate, isolating failures
pub(crate) fn fan_out<P: 'static>(
    network: NetworkId,
    stats: &NetworkStats,
    candidates: Vec<Candidate<P>>,
    packet: &Packet<P>,
    route: Route,
) {
    let sender = packet.sender();

    for (device, handle) in candidates {
        let Some(receiver) = handle.upgrade() else {
            trace!(network = %network, device = %device, "Receiver dropped without unregistering, skipping");
            stats.record_stale();
            continue;
        };

        match route {
            Route::SameDimension { range } => {
                if receiver.dimension() != sender.dimension {
                    continue;
                }
                let distance = sender.position.distance(receiver.position());
                // NaN distances never count as in range
                if range.is_some_and(|range| !(distance <= range)) {
                    continue;
                }
                deliver(network, stats, device, || {
                    receiver.receive_same_dimension(packet, distance)
                });
            }
            Route::DifferentDimension => {
                deliver(network, stats, device, || {
                    receiver.receive_different_dimension(packet)
                });
            }
        }
    }
}

fn deliver<F>(network: NetworkId, stats: &NetworkStats, device: DeviceId, callback: F)
where
    F: FnOnce() -> Result<(), DeliveryError>,
{
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => stats.record_delivery(),
        Ok(Err(error)) => {
            warn!(network = %network, device = %device, error = %error, "Receiver failed to handle packet");
            stats.record_fault();
        }
        Err(_) => {
            warn!(network = %network, device = %device, "Receiver panicked while handling packet");
            stats.record_fault();
        }
    }
}
