//! Modem devices
//!
//! A [`Modem`] is the peripheral a program uses to talk on packet networks.
//! It is a [`PacketReceiver`] (so networks can deliver to it) and it knows
//! which networks it is attached to (so it can transmit on all of them).
//!
//! ## Lifecycle
//!
//! - `attach` registers the modem with a network, `detach` unregisters it.
//! - `detach_all` is the deactivation hook; dropping a modem runs it too.
//! - A modem may sit on any number of networks at once, for example a wired
//!   segment and the ambient wireless network of its region.

use std::sync::Arc;

use derive_more::Display;
use modemnet_core::{
    DVec3, DeliveryError, DeviceId, DimensionId, Location, NetworkId, NetworkKind, Packet,
    PacketNetwork, PacketReceiver, SenderInfo,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::config::{ModemConfig, Weather};
use crate::error::{ModemError, ModemResult};
use crate::event::ModemEvent;
use crate::state::{ModemState, check_channel};

/// The flavour of modem, which decides how it transmits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ModemKind {
    /// Cable modem; range plays no part
    #[display("wired")]
    Wired,
    /// Radio modem; range from altitude and weather
    #[display("wireless")]
    Wireless,
    /// Radio modem whose messages cross dimensions and ignore distance
    #[display("ender")]
    Ender,
}

impl ModemKind {
    /// The kind of network this modem can attach to
    pub fn network_kind(&self) -> NetworkKind {
        match self {
            ModemKind::Wired => NetworkKind::Wired,
            ModemKind::Wireless | ModemKind::Ender => NetworkKind::Wireless,
        }
    }
}

/// A modem peripheral
pub struct Modem<P> {
    device: DeviceId,
    name: String,
    kind: ModemKind,
    config: Arc<ModemConfig>,
    location: RwLock<Location>,
    weather: RwLock<Weather>,
    state: ModemState,
    networks: Mutex<Vec<Arc<dyn PacketNetwork<P>>>>,
    events: mpsc::UnboundedSender<ModemEvent<P>>,
}

impl<P: Clone + Send + Sync + 'static> Modem<P> {
    /// Create a modem and the queue its events are delivered on
    pub fn new(
        device: DeviceId,
        name: impl Into<String>,
        kind: ModemKind,
        location: Location,
        config: Arc<ModemConfig>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<ModemEvent<P>>) {
        let (events, rx) = mpsc::unbounded_channel();
        let modem = Arc::new(Self {
            device,
            name: name.into(),
            kind,
            state: ModemState::new(config.max_open_channels),
            config,
            location: RwLock::new(location),
            weather: RwLock::new(Weather::default()),
            networks: Mutex::new(Vec::new()),
            events,
        });
        (modem, rx)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModemKind {
        self.kind
    }

    pub fn is_wireless(&self) -> bool {
        self.kind != ModemKind::Wired
    }

    pub fn set_location(&self, location: Location) {
        *self.location.write() = location;
    }

    pub fn set_weather(&self, weather: Weather) {
        *self.weather.write() = weather;
    }

    /// Range passed with same-dimension transmissions
    ///
    /// Wired modems report zero (cable networks ignore range) and ender
    /// modems report an unlimited range.
    pub fn range(&self) -> f64 {
        match self.kind {
            ModemKind::Wired => 0.0,
            ModemKind::Ender => f64::INFINITY,
            ModemKind::Wireless => {
                let altitude = self.location.read().position.y;
                self.config.wireless_range(altitude, *self.weather.read())
            }
        }
    }

    pub fn open(&self, channel: i32) -> ModemResult<bool> {
        self.state.open(channel)
    }

    pub fn close(&self, channel: i32) -> ModemResult<bool> {
        self.state.close(channel)
    }

    pub fn is_open(&self, channel: i32) -> bool {
        self.state.is_open(channel)
    }

    pub fn close_all(&self) -> usize {
        self.state.close_all()
    }

    pub fn open_channels(&self) -> Vec<i32> {
        self.state.open_channels()
    }

    /// Register with a network
    ///
    /// Attaching twice to the same network is a no-op. A wired modem only
    /// attaches to wired networks and radio modems only to wireless ones.
    /// Fails if another live modem already holds this device id there.
    pub fn attach(self: &Arc<Self>, network: Arc<dyn PacketNetwork<P>>) -> ModemResult<bool> {
        if network.kind() != self.kind.network_kind() {
            return Err(ModemError::IncompatibleNetwork {
                modem: self.kind,
                network: network.kind(),
            });
        }

        let mut networks = self.networks.lock();
        if networks.iter().any(|n| n.id() == network.id()) {
            return Ok(false);
        }
        let receiver: Arc<dyn PacketReceiver<P>> = self.clone();
        if !network.add_receiver(&receiver) {
            warn!(modem = %self.device, network = %network.id(), "Device id already attached by another modem");
            return Err(ModemError::DeviceAlreadyAttached {
                device: self.device,
                network: network.id(),
            });
        }
        debug!(modem = %self.device, network = %network.id(), kind = %network.kind(), "Modem attached");
        networks.push(network);
        Ok(true)
    }

    /// Unregister from one network
    pub fn detach(&self, network: NetworkId) -> bool {
        let detached = {
            let mut networks = self.networks.lock();
            networks
                .iter()
                .position(|n| n.id() == network)
                .map(|index| networks.remove(index))
        };
        match detached {
            Some(network) => {
                network.remove_receiver(self.device);
                debug!(modem = %self.device, network = %network.id(), "Modem detached");
                true
            }
            None => false,
        }
    }

    /// Unregister from every network. Returns how many there were.
    pub fn detach_all(&self) -> usize {
        let networks: Vec<_> = self.networks.lock().drain(..).collect();
        for network in &networks {
            network.remove_receiver(self.device);
        }
        if !networks.is_empty() {
            debug!(modem = %self.device, count = networks.len(), "Modem detached from all networks");
        }
        networks.len()
    }

    /// Networks this modem is attached to
    pub fn networks(&self) -> Vec<NetworkId> {
        self.networks.lock().iter().map(|n| n.id()).collect()
    }

    /// Send a message on every attached network
    ///
    /// Returns how many networks the message was submitted to. Delivery
    /// itself is silent: the sender never learns who heard it.
    pub fn transmit(&self, channel: i32, reply_channel: i32, payload: P) -> ModemResult<usize> {
        check_channel(channel)?;
        check_channel(reply_channel)?;

        let sender = SenderInfo::of::<P, _>(self);
        let range = self.range();
        // Networks are called without our lock held; deliveries may re-enter
        let networks: Vec<_> = self.networks.lock().clone();

        for network in &networks {
            let packet = Packet::new(
                sender.clone(),
                channel,
                reply_channel,
                payload.clone(),
                network.id(),
            );
            match self.kind {
                ModemKind::Ender => network.transmit_interdimensional(&packet),
                ModemKind::Wired | ModemKind::Wireless => {
                    network.transmit_same_dimension(&packet, range)
                }
            }
        }
        trace!(modem = %self.device, channel, reply_channel, networks = networks.len(), "Modem transmitted");
        Ok(networks.len())
    }

    fn accept(&self, packet: &Packet<P>, distance: Option<f64>) -> Result<(), DeliveryError> {
        if packet.is_from(self.device) {
            return Ok(());
        }
        if !self.state.is_open(packet.channel()) {
            trace!(modem = %self.device, channel = packet.channel(), "Channel closed, ignoring packet");
            return Ok(());
        }

        let event = ModemEvent::Message {
            modem: self.name.clone(),
            channel: packet.channel(),
            reply_channel: packet.reply_channel(),
            payload: packet.payload().clone(),
            distance,
            sender: packet.sender().device,
        };
        self.events
            .send(event)
            .map_err(|_| DeliveryError::ReceiverClosed)
    }
}

impl<P: Clone + Send + Sync + 'static> PacketReceiver<P> for Modem<P> {
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
        self.accept(packet, Some(distance))
    }

    fn receive_different_dimension(&self, packet: &Packet<P>) -> Result<(), DeliveryError> {
        self.accept(packet, None)
    }

    fn location(&self) -> Location {
        self.location.read().clone()
    }
}

impl<P> Drop for Modem<P> {
    fn drop(&mut self) {
        let networks = std::mem::take(self.networks.get_mut());
        if !networks.is_empty() {
            debug!(modem = %self.device, count = networks.len(), "Modem dropped while attached, detaching");
        }
        for network in networks {
            network.remove_receiver(self.device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modemnet_routing::{WiredNetwork, WirelessNetwork};

    fn modem(
        id: u64,
        kind: ModemKind,
        position: DVec3,
    ) -> (Arc<Modem<String>>, mpsc::UnboundedReceiver<ModemEvent<String>>) {
        Modem::new(
            DeviceId::new(id),
            "top",
            kind,
            Location::new(position, "overworld"),
            Arc::new(ModemConfig::default()),
        )
    }

    #[test]
    fn test_range_by_kind() {
        let (wired, _) = modem(1, ModemKind::Wired, DVec3::ZERO);
        let (ender, _) = modem(2, ModemKind::Ender, DVec3::ZERO);
        let (radio, _) = modem(3, ModemKind::Wireless, DVec3::new(0.0, 10.0, 0.0));

        assert_eq!(wired.range(), 0.0);
        assert_eq!(ender.range(), f64::INFINITY);
        assert_eq!(radio.range(), 64.0);

        radio.set_location(Location::new(DVec3::new(0.0, 383.0, 0.0), "overworld"));
        assert!((radio.range() - 384.0).abs() < 1e-9);
    }

    #[test]
    fn test_attach_checks_kind() {
        let (wired, _) = modem(1, ModemKind::Wired, DVec3::ZERO);
        let wireless: Arc<WirelessNetwork<String>> = WirelessNetwork::shared();

        assert!(matches!(
            wired.attach(wireless),
            Err(ModemError::IncompatibleNetwork { .. })
        ));
        assert!(wired.attach(WiredNetwork::<String>::shared()).unwrap());
    }

    #[test]
    fn test_attach_is_idempotent() {
        let (radio, _) = modem(1, ModemKind::Wireless, DVec3::ZERO);
        let network: Arc<WirelessNetwork<String>> = WirelessNetwork::shared();

        assert!(radio.attach(network.clone()).unwrap());
        assert!(!radio.attach(network.clone()).unwrap());
        assert_eq!(radio.networks(), vec![network.id()]);
        assert!(network.contains(DeviceId::new(1)));
    }

    #[test]
    fn test_attach_rejects_duplicate_device() {
        let (first, _) = modem(1, ModemKind::Wireless, DVec3::ZERO);
        let network: Arc<WirelessNetwork<String>> = WirelessNetwork::shared();
        first.attach(network.clone()).unwrap();

        {
            let (impostor, _) = modem(1, ModemKind::Wireless, DVec3::X);
            assert!(matches!(
                impostor.attach(network.clone()),
                Err(ModemError::DeviceAlreadyAttached { .. })
            ));
            assert!(impostor.networks().is_empty());
            assert_eq!(impostor.detach_all(), 0);
        }

        // Dropping the rejected modem leaves the original registered
        assert!(network.contains(DeviceId::new(1)));
        assert_eq!(first.networks(), vec![network.id()]);
    }

    #[test]
    fn test_detach() {
        let (radio, _) = modem(1, ModemKind::Wireless, DVec3::ZERO);
        let network: Arc<WirelessNetwork<String>> = WirelessNetwork::shared();
        radio.attach(network.clone()).unwrap();

        assert!(radio.detach(network.id()));
        assert!(!radio.detach(network.id()));
        assert!(!network.contains(DeviceId::new(1)));
    }

    #[test]
    fn test_drop_detaches() {
        let network: Arc<WirelessNetwork<String>> = WirelessNetwork::shared();
        {
            let (radio, _) = modem(1, ModemKind::Wireless, DVec3::ZERO);
            radio.attach(network.clone()).unwrap();
            assert_eq!(network.len(), 1);
        }
        assert!(network.is_empty());
    }

    #[test]
    fn test_transmit_validates_channels() {
        let (radio, _) = modem(1, ModemKind::Wireless, DVec3::ZERO);
        assert!(matches!(
            radio.transmit(-1, 0, "x".to_string()),
            Err(ModemError::ChannelOutOfRange(-1))
        ));
        assert!(matches!(
            radio.transmit(0, 65536, "x".to_string()),
            Err(ModemError::ChannelOutOfRange(65536))
        ));
        // No networks attached is not an error
        assert_eq!(radio.transmit(0, 0, "x".to_string()).unwrap(), 0);
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let network: Arc<WirelessNetwork<String>> = WirelessNetwork::shared();
        let (a, _) = modem(1, ModemKind::Wireless, DVec3::ZERO);
        let (b, mut b_rx) = modem(2, ModemKind::Wireless, DVec3::new(1.0, 0.0, 0.0));
        a.attach(network.clone()).unwrap();
        b.attach(network.clone()).unwrap();

        a.transmit(5, 5, "unheard".to_string()).unwrap();
        assert!(b_rx.try_recv().is_err());

        b.open(5).unwrap();
        a.transmit(5, 6, "heard".to_string()).unwrap();
        match b_rx.try_recv().unwrap() {
            ModemEvent::Message {
                modem,
                channel,
                reply_channel,
                payload,
                distance,
                sender,
            } => {
                assert_eq!(modem, "top");
                assert_eq!((channel, reply_channel), (5, 6));
                assert_eq!(payload, "heard");
                assert_eq!(distance, Some(1.0));
                assert_eq!(sender, DeviceId::new(1));
            }
        }
    }

    #[test]
    fn test_closed_queue_is_reported_to_network() {
        let network: Arc<WirelessNetwork<String>> = WirelessNetwork::shared();
        let (a, _) = modem(1, ModemKind::Wireless, DVec3::ZERO);
        let (b, b_rx) = modem(2, ModemKind::Wireless, DVec3::ZERO);
        a.attach(network.clone()).unwrap();
        b.attach(network.clone()).unwrap();
        b.open(1).unwrap();
        drop(b_rx);

        a.transmit(1, 1, "lost".to_string()).unwrap();
        assert_eq!(network.stats().faults, 1);
    }
}
