//! Events a modem raises for the program that owns it

use modemnet_core::DeviceId;

/// Something the program attached to a modem should be told about
///
/// The program runtime drains these from the receiver returned by
/// [`Modem::new`](crate::Modem::new) and turns them into program events.
#[derive(Debug, Clone, PartialEq)]
pub enum ModemEvent<P> {
    /// A packet arrived on an open channel
    Message {
        /// Name the modem is attached under (a side or peripheral name)
        modem: String,
        channel: i32,
        reply_channel: i32,
        payload: P,
        /// Distance to the sender, `None` when it came from another dimension
        distance: Option<f64>,
        /// The device that sent it
        sender: DeviceId,
    },
}

impl<P> ModemEvent<P> {
    /// Event name as seen by programs
    pub fn name(&self) -> &'static str {
        match self {
            ModemEvent::Message { .. } => "modem_message",
        }
    }
}
