//! Trait abstraction for the BLE link to enable testing

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A device seen during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// MAC address (`AA:BB:CC:DD:EE:FF`)
    pub address: String,
    /// Advertised local name, possibly NUL padded
    pub name: String,
}

/// Device discovery and connection
#[async_trait]
pub trait Transport: Send {
    /// Scan for `scan_window` and report every device seen
    ///
    /// # Errors
    ///
    /// Returns `Discovery` if the adapter is unusable
    async fn discover(&mut self, scan_window: Duration) -> Result<Vec<DiscoveredDevice>>;

    /// Connect to `address` and enable measurement notifications
    ///
    /// # Errors
    ///
    /// Returns `Connect` if the device cannot be reached or subscribed to
    async fn connect(&mut self, address: &str) -> Result<Box<dyn Connection>>;
}

/// An established link delivering notification payloads in arrival order
#[async_trait]
pub trait Connection: Send {
    /// Wait for the next notification
    ///
    /// Returns `Ok(None)` once the link is gone.
    async fn next_fragment(&mut self) -> Result<Option<Bytes>>;

    /// Tear the link down
    async fn disconnect(&mut self) -> Result<()>;
}

/// Receiver of notification payloads
///
/// Invoked once per notification, in arrival order, never concurrently.
/// The next fragment is not requested until the previous call has returned.
#[async_trait]
pub trait FragmentHandler: Send {
    async fn on_fragment(&mut self, fragment: &[u8]) -> Result<()>;
}
