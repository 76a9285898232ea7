//! Identities used by packet networks
//!
//! All three identities are opaque to the routing layer: devices and
//! networks are compared by equality only, dimensions likewise.

use std::sync::Arc;

use derive_more::Display;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a device (a modem or anything else that sends and receives)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[display("#{_0}")]
pub struct DeviceId(pub u64);

impl DeviceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for DeviceId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Identity of a world or dimension
///
/// Cheap to clone; compared by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct DimensionId(Arc<str>);

impl DimensionId {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DimensionId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Identity of a network instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId(Uuid);

impl NetworkId {
    /// Create a fresh random network identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NetworkId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First block of the uuid is plenty for logs
        let simple = self.0.simple().to_string();
        write!(f, "net-{}", &simple[..8])
    }
}

/// A point in a specific dimension
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub position: DVec3,
    pub dimension: DimensionId,
}

impl Location {
    pub fn new(position: DVec3, dimension: impl Into<DimensionId>) -> Self {
        Self {
            position,
            dimension: dimension.into(),
        }
    }

    /// Euclidean distance to another location, ignoring dimension
    pub fn distance_to(&self, other: &Location) -> f64 {
        self.position.distance(other.position)
    }

    pub fn same_dimension(&self, other: &Location) -> bool {
        self.dimension == other.dimension
    }
}
