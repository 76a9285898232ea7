//! # Modemnet Modem
//!
//! Modem devices on top of the packet networks in `modemnet-routing`.
//!
//! A [`Modem`] keeps the per-device state a program sees: which channels are
//! open, where the device is, and which networks it is attached to. Incoming
//! packets on open channels are turned into [`ModemEvent`]s on a queue the
//! program runtime drains.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use modemnet_core::{DVec3, DeviceId, Location};
//! use modemnet_modem::{Modem, ModemConfig, ModemEvent, ModemKind, NetworkRegistry};
//!
//! let registry: NetworkRegistry<String> = NetworkRegistry::new();
//! let config = Arc::new(ModemConfig::default());
//!
//! let (left, _) = Modem::new(
//!     DeviceId::new(1), "left", ModemKind::Wireless,
//!     Location::new(DVec3::ZERO, "overworld"), config.clone(),
//! );
//! let (right, mut events) = Modem::new(
//!     DeviceId::new(2), "right", ModemKind::Wireless,
//!     Location::new(DVec3::new(10.0, 0.0, 0.0), "overworld"), config,
//! );
//!
//! let air = registry.wireless("overworld");
//! left.attach(air.clone()).unwrap();
//! right.attach(air).unwrap();
//! right.open(42).unwrap();
//!
//! left.transmit(42, 43, "hello".to_string()).unwrap();
//! let ModemEvent::Message { payload, .. } = events.try_recv().unwrap();
//! assert_eq!(payload, "hello");
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod modem;
pub mod registry;
pub mod state;

pub use config::{ModemConfig, Weather};
pub use error::{ModemError, ModemResult};
pub use event::ModemEvent;
pub use modem::{Modem, ModemKind};
pub use registry::NetworkRegistry;
pub use state::{MAX_CHANNEL, MIN_CHANNEL, ModemState};
