use std::fmt;

use crate::state::SharedState;

// Peers whose online state the controller tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    ControlSurface,
    Switcher,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::ControlSurface => write!(f, "control surface"),
            Device::Switcher => write!(f, "switcher"),
        }
    }
}

// Tracks online/offline transitions; never touches the routing table
#[derive(Clone)]
pub struct ConnectivityMonitor {
    state: SharedState,
}

impl ConnectivityMonitor {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    // Returns true when the state actually changed
    pub async fn set_online(&self, device: Device, online: bool) -> bool {
        let mut state = self.state.lock().await;
        let previous = state.online.insert(device, online).unwrap_or(false);
        let changed = previous != online;

        if changed && online {
            log::info!("{} came online", device);
        } else if changed {
            log::warn!("{} went offline", device);
        } else {
            log::debug!("{} online state unchanged ({})", device, online);
        }

        changed
    }

    pub async fn is_online(&self, device: Device) -> bool {
        self.state.lock().await.is_online(device)
    }
}
