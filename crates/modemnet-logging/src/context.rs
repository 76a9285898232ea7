//! Device context for log scopes
//!
//! A thread-local slot holds the device whose work is currently being
//! logged. Spans created while a [`DeviceContextGuard`] is alive are tagged
//! with it by [`DeviceContextLayer`](crate::layers::DeviceContextLayer).

use std::cell::RefCell;

use modemnet_core::DeviceId;
use uuid::Uuid;

/// Device context stored in thread-local storage
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceContextData {
    pub device: DeviceId,
    /// Free-form role, e.g. "modem" or "relay"
    pub label: String,
    /// Unique id for this scope, to tell apart repeated runs of one device
    pub instance_id: Uuid,
}

thread_local! {
    static DEVICE_CONTEXT: RefCell<Option<DeviceContextData>> = const { RefCell::new(None) };
}

/// RAII guard for device context
///
/// Sets the context for the current thread and restores the previous one
/// on drop, so guards nest.
///
/// ```
/// use modemnet_core::DeviceId;
/// use modemnet_logging::DeviceContextGuard;
///
/// let _guard = DeviceContextGuard::new(DeviceId::new(7), "modem");
/// assert_eq!(DeviceContextGuard::current_device(), Some(DeviceId::new(7)));
/// tracing::info!("Transmitting");
/// ```
pub struct DeviceContextGuard {
    previous: Option<DeviceContextData>,
}

impl DeviceContextGuard {
    pub fn new(device: DeviceId, label: impl Into<String>) -> Self {
        Self::with_instance_id(device, label, Uuid::new_v4())
    }

    /// Create a guard with a specific instance ID
    pub fn with_instance_id(device: DeviceId, label: impl Into<String>, instance_id: Uuid) -> Self {
        let context = DeviceContextData {
            device,
            label: label.into(),
            instance_id,
        };
        let previous = DEVICE_CONTEXT.with(|ctx| ctx.borrow_mut().replace(context));
        Self { previous }
    }

    /// Get the current device context (if any)
    pub fn current() -> Option<DeviceContextData> {
        DEVICE_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    pub fn current_device() -> Option<DeviceId> {
        DEVICE_CONTEXT.with(|ctx| ctx.borrow().as_ref().map(|data| data.device))
    }
}

impl Drop for DeviceContextGuard {
    fn drop(&mut self) {
        DEVICE_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Run a block with a device context
///
/// ```
/// use modemnet_core::DeviceId;
/// use modemnet_logging::with_device_context;
///
/// let sent = with_device_context!(DeviceId::new(1), "modem", {
///     tracing::debug!("Sending");
///     true
/// });
/// assert!(sent);
/// ```
#[macro_export]
macro_rules! with_device_context {
    ($device:expr, $label:expr, $body:block) => {{
        let _guard = $crate::context::DeviceContextGuard::new($device, $label);
        $body
    }};
}
