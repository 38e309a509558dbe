//! # Session Controller
//!
//! Supervises the link to the meter and drives the measurement pipeline.
//!
//! ## Control Flow
//!
//! 1. **Target resolution**: use the configured address, or scan and pick the
//!    first device advertising the configured name
//! 2. **Connect**: on failure, poll again every retry interval when waiting
//!    for the device is enabled, otherwise give up
//! 3. **Stream**: feed every notification to the pipeline, in order
//! 4. **Loss**: reconnect forever when enabled, otherwise end the session

use tracing::{debug, error, info, trace, warn};

use crate::ble::transport::{Connection, FragmentHandler, Transport};
use crate::config::DeviceConfig;
use crate::error::{MeterError, Result};
use crate::pipeline::Pipeline;

/// Owns the transport and the pipeline for one telemetry session
pub struct SessionController<T: Transport> {
    transport: T,
    device: DeviceConfig,
    pipeline: Pipeline,
}

impl<T: Transport> SessionController<T> {
    pub fn new(transport: T, device: DeviceConfig, pipeline: Pipeline) -> Self {
        Self {
            transport,
            device,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run until a terminal error
    ///
    /// # Errors
    ///
    /// - `Discovery` / `DeviceNotFound` if no device could be selected and
    ///   waiting is disabled
    /// - `Connect` if the first connection fails and waiting is disabled
    /// - `ConnectionLost` if the link drops and reconnecting is disabled
    /// - `Io` / `Json` if output cannot be written; the link is closed first
    pub async fn run(&mut self) -> Result<()> {
        let mut connection = self.establish(self.device.wait).await?;
        self.pipeline.write_header().await?;

        loop {
            debug!("Connected, waiting for data");
            let streamed = self.stream(connection.as_mut()).await;

            if let Err(e) = connection.disconnect().await {
                debug!("Disconnect failed: {}", e);
            }
            streamed?;

            if !self.device.reconnect {
                return Err(MeterError::ConnectionLost);
            }

            warn!("Connection to device lost, reconnecting");
            self.pipeline.reset();
            tokio::time::sleep(self.device.retry_interval()).await;
            connection = self.establish(true).await?;
            info!("Reconnected");
        }
    }

    /// Pump notifications into the pipeline until the link goes away
    ///
    /// Only output failures are returned as errors; a failing link ends the
    /// stream like a clean loss.
    async fn stream(&mut self, connection: &mut dyn Connection) -> Result<()> {
        loop {
            let fragment = match connection.next_fragment().await {
                Ok(Some(fragment)) => fragment,
                Ok(None) => return Ok(()),
                Err(e) => {
                    warn!("Notification stream failed: {}", e);
                    return Ok(());
                }
            };
            self.pipeline.on_fragment(&fragment).await?;
        }
    }

    /// Resolve a target and connect, polling while `persistent`
    async fn establish(&mut self, persistent: bool) -> Result<Box<dyn Connection>> {
        loop {
            match self.try_connect().await {
                Ok(connection) => return Ok(connection),
                Err(e) if persistent => {
                    report(&e);
                    debug!("Waiting for device...");
                    tokio::time::sleep(self.device.retry_interval()).await;
                }
                Err(e) => {
                    report(&e);
                    return Err(e);
                }
            }
        }
    }

    async fn try_connect(&mut self) -> Result<Box<dyn Connection>> {
        let target = self.resolve_target().await?;
        info!("Connecting to {}", target);
        self.transport.connect(&target).await
    }

    async fn resolve_target(&mut self) -> Result<String> {
        if let Some(address) = &self.device.address {
            return Ok(address.clone());
        }

        debug!("Searching for compatible devices");
        let devices = self.transport.discover(self.device.scan_window()).await?;

        for device in &devices {
            trace!("Found device - name: {}, address: {}", device.name, device.address);
        }

        let wanted = self.device.name.as_str();
        devices
            .into_iter()
            .find(|d| d.name.trim_end_matches('\0') == wanted)
            .map(|d| {
                debug!("Found compatible device at address {}", d.address);
                d.address
            })
            .ok_or_else(|| MeterError::DeviceNotFound(wanted.to_string()))
    }
}

fn report(e: &MeterError) {
    match e {
        MeterError::Discovery(_) => {
            error!("{}. Is bluetooth enabled? Are you root?", e);
        }
        MeterError::DeviceNotFound(_) => info!("{}", e),
        _ => warn!("{}", e),
    }
}
