use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::connectivity::Device;

pub type SharedState = Arc<Mutex<RoutingState>>;

// Size of the switching device plus the surface's join block width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixSize {
    pub inputs: u32,
    pub outputs: u32,
    pub stride: u32,
}

impl MatrixSize {
    // Square layout: one join per input in every output block
    pub fn new(inputs: u32, outputs: u32) -> Self {
        Self {
            inputs,
            outputs,
            stride: outputs,
        }
    }

    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    pub fn contains(&self, input: u32, output: u32) -> bool {
        (1..=self.inputs).contains(&input) && (1..=self.outputs).contains(&output)
    }
}

// Everything the controller knows about the matrix and its peers
#[derive(Debug, Clone)]
pub struct RoutingState {
    pub size: MatrixSize,
    // output -> input; a missing entry or `None` means unrouted
    pub routes: BTreeMap<u32, Option<u32>>,
    pub video_detected: HashMap<u32, bool>,
    pub online: HashMap<Device, bool>,
}

impl RoutingState {
    pub fn new(size: MatrixSize) -> Self {
        Self {
            size,
            routes: BTreeMap::new(),
            video_detected: HashMap::new(),
            online: HashMap::new(),
        }
    }

    pub fn shared(size: MatrixSize) -> SharedState {
        Arc::new(Mutex::new(Self::new(size)))
    }

    pub fn active_input(&self, output: u32) -> Option<u32> {
        self.routes.get(&output).copied().flatten()
    }

    // Devices start offline until their first online event
    pub fn is_online(&self, device: Device) -> bool {
        self.online.get(&device).copied().unwrap_or(false)
    }
}
