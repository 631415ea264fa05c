//! Seams to the two external collaborators: the switching device and the
//! control surface. Calls are fire-and-forget; `Err` only reports that the
//! request could not be handed off at all.

use async_trait::async_trait;
use tokio::sync::mpsc;

// Commands sent to the switching-device task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchCommand {
    Route { input: u32, output: u32 },
}

// Updates sent to the control-surface task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceUpdate {
    Digital { join: u32, value: bool },
}

#[async_trait]
pub trait SwitchingDevice: Send + Sync {
    // Ask the device to feed `output` from `input` (both 1-based)
    async fn request_route(&self, input: u32, output: u32) -> Result<(), String>;
}

#[async_trait]
pub trait ControlSurface: Send + Sync {
    // Drive a digital feedback join
    async fn set_boolean(&self, join: u32, value: bool) -> Result<(), String>;
}

// Switching device backed by the channel into the videohub client task
#[derive(Debug, Clone)]
pub struct ChannelSwitcher {
    tx: mpsc::Sender<SwitchCommand>,
}

impl ChannelSwitcher {
    pub fn new(tx: mpsc::Sender<SwitchCommand>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl SwitchingDevice for ChannelSwitcher {
    async fn request_route(&self, input: u32, output: u32) -> Result<(), String> {
        self.tx
            .try_send(SwitchCommand::Route { input, output })
            .map_err(|e| format!("switcher command queue: {}", e))
    }
}

// Control surface backed by the channel into the rship emitter task
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    tx: mpsc::Sender<SurfaceUpdate>,
}

impl ChannelSurface {
    pub fn new(tx: mpsc::Sender<SurfaceUpdate>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ControlSurface for ChannelSurface {
    async fn set_boolean(&self, join: u32, value: bool) -> Result<(), String> {
        // Waits for room so feedback writes are never dropped or reordered
        self.tx
            .send(SurfaceUpdate::Digital { join, value })
            .await
            .map_err(|e| format!("surface update queue: {}", e))
    }
}
