//! Open-channel bookkeeping for a modem
//!
//! A modem only hears packets on channels it has opened. Channels are
//! limited to `0..=65535` and a modem may only hold so many open at once.

use std::collections::BTreeSet;

use parking_lot::Mutex;

use crate::error::{ModemError, ModemResult};

/// Lowest usable channel
pub const MIN_CHANNEL: i32 = 0;
/// Highest usable channel
pub const MAX_CHANNEL: i32 = 65535;

/// Check that a channel is inside the usable range
pub fn check_channel(channel: i32) -> ModemResult<i32> {
    if (MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
        Ok(channel)
    } else {
        Err(ModemError::ChannelOutOfRange(channel))
    }
}

/// The set of channels a modem is listening on
#[derive(Debug)]
pub struct ModemState {
    open: Mutex<BTreeSet<i32>>,
    max_open: usize,
}

impl ModemState {
    pub fn new(max_open: usize) -> Self {
        Self {
            open: Mutex::new(BTreeSet::new()),
            max_open,
        }
    }

    /// Start listening on a channel. Returns whether it was newly opened.
    pub fn open(&self, channel: i32) -> ModemResult<bool> {
        let channel = check_channel(channel)?;
        let mut open = self.open.lock();
        if open.contains(&channel) {
            return Ok(false);
        }
        if open.len() >= self.max_open {
            return Err(ModemError::TooManyOpenChannels(self.max_open));
        }
        Ok(open.insert(channel))
    }

    /// Stop listening on a channel. Returns whether it was open.
    pub fn close(&self, channel: i32) -> ModemResult<bool> {
        let channel = check_channel(channel)?;
        Ok(self.open.lock().remove(&channel))
    }

    pub fn is_open(&self, channel: i32) -> bool {
        self.open.lock().contains(&channel)
    }

    /// Close every channel, returning how many were open
    pub fn close_all(&self) -> usize {
        let mut open = self.open.lock();
        let count = open.len();
        open.clear();
        count
    }

    /// Open channels in ascending order
    pub fn open_channels(&self) -> Vec<i32> {
        self.open.lock().iter().copied().collect()
    }

    pub fn max_open(&self) -> usize {
        self.max_open
    }
}
