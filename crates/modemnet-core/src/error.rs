//! Error types for modemnet

use thiserror::Error;

/// Errors a receiver may report while handling a delivered packet
///
/// These never reach the sender. Networks log them and move on to the
/// next receiver.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Receiver is closed")]
    ReceiverClosed,

    #[error("Receiver rejected packet: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_display() {
        assert!(format!("{}", DeliveryError::ReceiverClosed).contains("closed"));

        let err = DeliveryError::Rejected("queue full".to_string());
        assert!(format!("{}", err).contains("queue full"));
    }
}
