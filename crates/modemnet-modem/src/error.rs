//! Modem error types

use modemnet_core::{DeviceId, NetworkId, NetworkKind};
use thiserror::Error;

use crate::modem::ModemKind;

/// Errors surfaced to the program driving a modem
#[derive(Debug, Error)]
pub enum ModemError {
    #[error("Channel {0} out of range (expected 0-65535)")]
    ChannelOutOfRange(i32),

    #[error("Too many open channels (limit {0})")]
    TooManyOpenChannels(usize),

    #[error("A {modem} modem cannot attach to a {network} network")]
    IncompatibleNetwork {
        modem: ModemKind,
        network: NetworkKind,
    },

    #[error("Network {network} already has a live device {device}")]
    DeviceAlreadyAttached { device: DeviceId, network: NetworkId },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Result type for modem operations
pub type ModemResult<T> = Result<T, ModemError>;
