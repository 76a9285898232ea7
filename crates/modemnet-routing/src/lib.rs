//! # Modemnet Routing
//!
//! The two routing engines behind [`PacketNetwork`].
//!
//! ## Core Components
//!
//! - [`WirelessNetwork`]: Broadcast by range. A flat registry; each
//!   transmission checks every receiver's dimension and distance.
//! - [`WiredNetwork`]: Broadcast over cables. Delivery reaches exactly the
//!   sender's connected component, whatever the distance.
//! - [`ComponentGraph`]: Incremental connected components used by the wired
//!   engine. Merges by size on connect, re-walks only the affected
//!   component after a disconnect.
//! - [`NetworkStats`]: Delivery counters kept by both engines.
//!
//! ## Delivery
//!
//! Transmission is a synchronous fan-out. The candidate receivers are copied
//! out under the network's lock and the lock is released before any callback
//! runs, so a receiver may connect, disconnect or unregister from inside its
//! own delivery. A callback that errors or panics is logged and skipped;
//! the remaining receivers still get the packet.
//!
//! ## Example
//!
//! ```rust,ignore
//! use modemnet_core::{PacketNetwork, Packet, SenderInfo};
//! use modemnet_routing::WiredNetwork;
//!
//! let network = WiredNetwork::shared();
//! network.add_receiver(&computer_a);
//! network.add_receiver(&computer_b);
//! network.connect(computer_a.device_id(), computer_b.device_id());
//!
//! let packet = Packet::new(SenderInfo::of(computer_a.as_ref()), 1, 1, payload, network.id());
//! network.transmit_same_dimension(&packet, 64.0);
//! ```

pub mod components;
mod delivery;
pub mod stats;
pub mod wired;
pub mod wireless;

// Re-export main types
pub use components::{ComponentGraph, ComponentId};
pub use stats::{NetworkStats, StatsSnapshot};
pub use wired::WiredNetwork;
pub use wireless::WirelessNetwork;

// Re-export core network types for convenience
pub use modemnet_core::{NetworkKind, PacketNetwork};
