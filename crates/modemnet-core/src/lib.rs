//! # Modemnet Core
//!
//! Core traits, types, and errors shared by the modemnet packet networks.
//!
//! Sandboxed computers talk to each other through in-world modems. A modem
//! builds a [`Packet`] and hands it to every [`PacketNetwork`] it is attached
//! to; the network decides which registered [`PacketReceiver`]s get a copy.
//!
//! ## Key Traits
//!
//! - [`PacketReceiver`]: Endpoint contract (location plus two delivery callbacks)
//! - [`PacketNetwork`]: Registry of receivers plus the two transmit operations
//!
//! ## Key Types
//!
//! - [`Packet`]: Immutable envelope routed by a network
//! - [`SenderInfo`]: Snapshot of where a packet was sent from
//! - [`DeviceId`], [`DimensionId`], [`NetworkId`]: Opaque identities
//! - [`RecordingReceiver`]: In-memory receiver for tests and simulations

pub mod error;
pub mod identity;
pub mod mock_receiver;
pub mod network;
pub mod packet;
pub mod receiver;

// Re-export main types
pub use error::*;
pub use identity::*;
pub use mock_receiver::*;
pub use network::*;
pub use packet::*;
pub use receiver::*;

pub use glam::DVec3;
