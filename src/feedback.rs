//! Feedback synchronizer.
//!
//! Mirrors the routed input of one output onto that output's block of
//! indicator joins. Every join in the block is cleared before the active one
//! is set, so a consumer reading the joins one at a time never sees two lit
//! indicators for the same output.

use crate::join::{self, Crosspoint};
use crate::transport::ControlSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalUpdate {
    pub join: u32,
    pub value: bool,
}

/// Builds the ordered writes for `output` now fed by `active` (`None` when unrouted).
///
/// An active input outside the block (`input > stride`) only clears, since
/// its join would belong to the neighbouring output.
pub fn plan(output: u32, active: Option<u32>, stride: u32) -> Vec<SignalUpdate> {
    let mut updates: Vec<SignalUpdate> = join::join_range(output, stride)
        .map(|join| SignalUpdate { join, value: false })
        .collect();

    match active {
        Some(input) if (1..=stride).contains(&input) => {
            let join = join::to_join_index(Crosspoint::new(input, output), stride);
            updates.push(SignalUpdate { join, value: true });
        }
        Some(input) => {
            log::warn!(
                "Input {} has no indicator on output {} (block width {})",
                input,
                output,
                stride
            );
        }
        None => {}
    }

    updates
}

#[derive(Debug, Clone, Copy)]
pub struct FeedbackSynchronizer {
    stride: u32,
}

impl FeedbackSynchronizer {
    pub fn new(stride: u32) -> Self {
        Self { stride }
    }

    // Writes the plan in order; a failed write is logged and the rest still go out
    pub async fn sync(&self, surface: &dyn ControlSurface, output: u32, active: Option<u32>) {
        for update in plan(output, active, self.stride) {
            if let Err(e) = surface.set_boolean(update.join, update.value).await {
                log::error!(
                    "Failed to set feedback join {} to {}: {}",
                    update.join,
                    update.value,
                    e
                );
            }
        }
    }
}
