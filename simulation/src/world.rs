//! A small world of named computers with modems
//!
//! The world plays the part of the program runtime: it owns each modem's
//! event queue and drains it into an inbox the scenarios can inspect.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use modemnet_core::{DVec3, DeviceId, Location, PacketReceiver};
use modemnet_logging::DeviceContextGuard;
use modemnet_modem::{Modem, ModemConfig, ModemEvent, ModemKind, NetworkRegistry};
use modemnet_routing::{StatsSnapshot, WiredNetwork, WirelessNetwork};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

/// Payloads in the simulation are plain JSON values
pub type Payload = Value;

/// A message as the receiving program saw it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Received {
    pub from: String,
    pub channel: i32,
    pub reply_channel: i32,
    pub payload: Payload,
    pub distance: Option<f64>,
}

struct Computer {
    modem: Arc<Modem<Payload>>,
    events: UnboundedReceiver<ModemEvent<Payload>>,
}

/// Named computers sharing one network registry
pub struct World {
    config: Arc<ModemConfig>,
    registry: NetworkRegistry<Payload>,
    computers: BTreeMap<String, Computer>,
    names: BTreeMap<DeviceId, String>,
    // Networks stay alive while the world does, even with nobody attached
    wired: BTreeMap<String, Arc<WiredNetwork<Payload>>>,
    wireless: BTreeMap<String, Arc<WirelessNetwork<Payload>>>,
    next_device: u64,
}

impl World {
    pub fn new(config: ModemConfig) -> Self {
        Self {
            config: Arc::new(config),
            registry: NetworkRegistry::new(),
            computers: BTreeMap::new(),
            names: BTreeMap::new(),
            wired: BTreeMap::new(),
            wireless: BTreeMap::new(),
            next_device: 1,
        }
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Place a computer with one modem. Every channel in `channels` is opened.
    pub fn add_computer(
        &mut self,
        name: &str,
        kind: ModemKind,
        location: Location,
        channels: &[i32],
    ) -> Result<DeviceId> {
        if self.computers.contains_key(name) {
            return Err(anyhow!("computer {} already exists", name));
        }
        let device = DeviceId::new(self.next_device);
        self.next_device += 1;

        let (modem, events) = Modem::new(device, name, kind, location, self.config.clone());
        for channel in channels {
            modem.open(*channel)?;
        }
        debug!(computer = name, device = %device, kind = %kind, "Computer placed");
        self.computers
            .insert(name.to_string(), Computer { modem, events });
        self.names.insert(device, name.to_string());
        Ok(device)
    }

    /// Take a computer out of the world; its modem leaves every network
    pub fn remove_computer(&mut self, name: &str) -> Result<()> {
        let computer = self
            .computers
            .remove(name)
            .ok_or_else(|| anyhow!("unknown computer {}", name))?;
        self.names.remove(&computer.modem.device_id());
        computer.modem.detach_all();
        Ok(())
    }

    pub fn modem(&self, name: &str) -> Result<&Arc<Modem<Payload>>> {
        self.computers
            .get(name)
            .map(|c| &c.modem)
            .ok_or_else(|| anyhow!("unknown computer {}", name))
    }

    pub fn device(&self, name: &str) -> Result<DeviceId> {
        Ok(self.modem(name)?.device_id())
    }

    pub fn computer_names(&self) -> Vec<String> {
        self.computers.keys().cloned().collect()
    }

    /// The named wired segment
    pub fn segment(&mut self, segment: &str) -> Arc<WiredNetwork<Payload>> {
        let network = self.registry.wired(segment);
        self.wired.insert(segment.to_string(), network.clone());
        network
    }

    /// The wireless network of a region
    pub fn region(&mut self, region: &str) -> Arc<WirelessNetwork<Payload>> {
        let network = self.registry.wireless(region);
        self.wireless.insert(region.to_string(), network.clone());
        network
    }

    /// Plug a wired computer into a segment
    pub fn plug(&mut self, name: &str, segment: &str) -> Result<bool> {
        let network = self.segment(segment);
        let attached = self
            .modem(name)?
            .attach(network)
            .with_context(|| format!("plugging {} into {}", name, segment))?;
        Ok(attached)
    }

    /// Tune a wireless computer into a region
    pub fn tune(&mut self, name: &str, region: &str) -> Result<bool> {
        let network = self.region(region);
        let attached = self
            .modem(name)?
            .attach(network)
            .with_context(|| format!("tuning {} into {}", name, region))?;
        Ok(attached)
    }

    /// Lay a cable between two computers on a segment
    pub fn cable(&mut self, segment: &str, a: &str, b: &str) -> Result<bool> {
        let (a, b) = (self.device(a)?, self.device(b)?);
        Ok(self.segment(segment).connect(a, b))
    }

    /// Cut the cable between two computers on a segment
    pub fn cut(&mut self, segment: &str, a: &str, b: &str) -> Result<bool> {
        let (a, b) = (self.device(a)?, self.device(b)?);
        Ok(self.segment(segment).disconnect(a, b))
    }

    /// Transmit from a computer on every network its modem is attached to
    pub fn send(&self, name: &str, channel: i32, reply_channel: i32, payload: Payload) -> Result<usize> {
        let modem = self.modem(name)?;
        let _context = DeviceContextGuard::new(modem.device_id(), name);
        let networks = modem.transmit(channel, reply_channel, payload)?;
        info!(computer = name, channel, networks, "Message sent");
        Ok(networks)
    }

    /// Drain and return everything a computer has received so far
    pub fn inbox(&mut self, name: &str) -> Result<Vec<Received>> {
        let computer = self
            .computers
            .get_mut(name)
            .ok_or_else(|| anyhow!("unknown computer {}", name))?;

        let mut received = Vec::new();
        while let Ok(event) = computer.events.try_recv() {
            let ModemEvent::Message {
                channel,
                reply_channel,
                payload,
                distance,
                sender,
                ..
            } = event;
            let from = self
                .names
                .get(&sender)
                .cloned()
                .unwrap_or_else(|| sender.to_string());
            received.push(Received {
                from,
                channel,
                reply_channel,
                payload,
                distance,
            });
        }
        Ok(received)
    }

    /// Names of the computers that have something waiting, inboxes drained
    pub fn drain_all(&mut self) -> Result<BTreeMap<String, Vec<Received>>> {
        let mut all = BTreeMap::new();
        for name in self.computer_names() {
            let received = self.inbox(&name)?;
            if !received.is_empty() {
                all.insert(name, received);
            }
        }
        Ok(all)
    }

    /// Statistics of every network the world has touched, keyed by name
    pub fn network_stats(&self) -> BTreeMap<String, StatsSnapshot> {
        let wired = self
            .wired
            .iter()
            .map(|(name, n)| (format!("wired:{}", name), n.stats()));
        let wireless = self
            .wireless
            .iter()
            .map(|(name, n)| (format!("wireless:{}", name), n.stats()));
        wired.chain(wireless).collect()
    }
}

/// Location in the overworld
pub fn overworld(x: f64, y: f64, z: f64) -> Location {
    Location::new(DVec3::new(x, y, z), "overworld")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_names_are_unique() {
        let mut world = World::new(ModemConfig::default());
        world
            .add_computer("a", ModemKind::Wired, overworld(0.0, 0.0, 0.0), &[])
            .unwrap();
        assert!(
            world
                .add_computer("a", ModemKind::Wired, overworld(0.0, 0.0, 0.0), &[])
                .is_err()
        );
    }

    #[test]
    fn test_inbox_names_the_sender() {
        let mut world = World::new(ModemConfig::default());
        world
            .add_computer("left", ModemKind::Wireless, overworld(0.0, 0.0, 0.0), &[])
            .unwrap();
        world
            .add_computer("right", ModemKind::Wireless, overworld(3.0, 4.0, 0.0), &[1])
            .unwrap();
        world.tune("left", "overworld").unwrap();
        world.tune("right", "overworld").unwrap();

        world.send("left", 1, 2, json!({"text": "hi"})).unwrap();

        let inbox = world.inbox("right").unwrap();
        assert_eq!(
            inbox,
            vec![Received {
                from: "left".to_string(),
                channel: 1,
                reply_channel: 2,
                payload: json!({"text": "hi"}),
                distance: Some(5.0),
            }]
        );
        assert!(world.inbox("right").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_network_kind_is_an_error() {
        let mut world = World::new(ModemConfig::default());
        world
            .add_computer("a", ModemKind::Wired, overworld(0.0, 0.0, 0.0), &[])
            .unwrap();
        assert!(world.tune("a", "overworld").is_err());
        assert!(world.plug("a", "lab").unwrap());
    }

    #[test]
    fn test_removed_computer_leaves_networks() {
        let mut world = World::new(ModemConfig::default());
        world
            .add_computer("a", ModemKind::Wired, overworld(0.0, 0.0, 0.0), &[])
            .unwrap();
        world.plug("a", "lab").unwrap();
        assert_eq!(world.segment("lab").len(), 1);

        world.remove_computer("a").unwrap();
        assert!(world.segment("lab").is_empty());
        assert!(world.modem("a").is_err());
    }
}
