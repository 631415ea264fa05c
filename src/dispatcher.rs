//! Event dispatcher: the single entry point for surface and device events.

use tokio::sync::mpsc;

use crate::connectivity::{ConnectivityMonitor, Device};
use crate::error::RouteError;
use crate::join;
use crate::routing::CrosspointRouter;
use crate::state::MatrixSize;

// Value carried by a control-surface signal change
#[derive(Debug, Clone, PartialEq)]
pub enum SignalValue {
    Digital(bool),
    Analog(u16),
    Serial(String),
}

// Everything the controller reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Signal { join: u32, value: SignalValue },
    DeviceOnline(Device),
    DeviceOffline(Device),
    OutputChanged { output: u32, input: Option<u32> },
    VideoDetected { input: u32, present: bool },
}

#[derive(Clone)]
pub struct EventDispatcher {
    size: MatrixSize,
    router: CrosspointRouter,
    monitor: ConnectivityMonitor,
}

impl EventDispatcher {
    pub fn new(size: MatrixSize, router: CrosspointRouter, monitor: ConnectivityMonitor) -> Self {
        Self {
            size,
            router,
            monitor,
        }
    }

    /// Routes one event to the component that owns it.
    ///
    /// Only a digital press can fail; device reports outside the matrix are logged and dropped.
    pub async fn dispatch(&self, event: Event) -> Result<(), RouteError> {
        match event {
            Event::Signal {
                join,
                value: SignalValue::Digital(true),
            } => self.press(join).await,
            Event::Signal {
                join,
                value: SignalValue::Digital(false),
            } => {
                // Release has no routing action
                log::debug!("Join {} released", join);
                Ok(())
            }
            Event::Signal {
                join,
                value: SignalValue::Analog(level),
            } => {
                log::debug!("Analog join {} changed to {}, no level control bound", join, level);
                Ok(())
            }
            Event::Signal { join, .. } => {
                log::debug!("Ignoring unsupported signal on join {}", join);
                Ok(())
            }
            Event::DeviceOnline(device) => {
                self.monitor.set_online(device, true).await;
                Ok(())
            }
            Event::DeviceOffline(device) => {
                self.monitor.set_online(device, false).await;
                Ok(())
            }
            Event::OutputChanged { output, input } => {
                self.router.record_actual_route(output, input).await;
                Ok(())
            }
            Event::VideoDetected { input, present } => {
                self.router.record_video_detected(input, present).await;
                Ok(())
            }
        }
    }

    async fn press(&self, join: u32) -> Result<(), RouteError> {
        // Joins are 1-based; anything past the panel maps beyond the matrix and the router rejects it
        if join == 0 {
            return Err(RouteError::OutOfRangeIndex {
                input: 0,
                output: 0,
                inputs: self.size.inputs,
                outputs: self.size.outputs,
            });
        }

        let crosspoint = join::to_crosspoint(join, self.size.stride);
        log::debug!(
            "Join {} pressed -> input {} output {}",
            join,
            crosspoint.input,
            crosspoint.output
        );
        self.router
            .apply_route(crosspoint.input, crosspoint.output)
            .await
    }

    // Drains events in arrival order until every sender is dropped
    pub async fn run(self, mut event_rx: mpsc::Receiver<Event>) {
        log::info!("Event dispatcher started");

        while let Some(event) = event_rx.recv().await {
            log::debug!("Processing event: {:?}", event);

            match self.dispatch(event).await {
                Ok(()) => {}
                Err(e @ RouteError::DeviceUnavailable(_)) => log::warn!("Route not sent: {}", e),
                Err(e) => log::error!("Failed to route: {}", e),
            }
        }

        log::info!("Event dispatcher stopped");
    }
}
