//! Mapping between flat control-surface join numbers and matrix crosspoints.
//!
//! The surface lays its digital joins out in blocks of `stride` signals, one
//! block per output: join `input + (output - 1) * stride` means "route `input`
//! to `output`". Both directions are plain arithmetic; range checks belong to
//! the caller.

use std::ops::RangeInclusive;

/// A single routing assignment: `output` is fed by `input`. Both are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crosspoint {
    pub input: u32,
    pub output: u32,
}

impl Crosspoint {
    pub fn new(input: u32, output: u32) -> Self {
        Self { input, output }
    }
}

/// Converts a 1-based join number into the crosspoint it selects.
///
/// `stride` must be at least 1 and `join` must be at least 1.
pub fn to_crosspoint(join: u32, stride: u32) -> Crosspoint {
    let output = (join - 1) / stride + 1;
    let input = join - (output - 1) * stride;
    Crosspoint { input, output }
}

/// Converts a crosspoint back into its join number. Inverse of [`to_crosspoint`].
pub fn to_join_index(crosspoint: Crosspoint, stride: u32) -> u32 {
    crosspoint.input + (crosspoint.output - 1) * stride
}

/// The block of joins owned by one output.
pub fn join_range(output: u32, stride: u32) -> RangeInclusive<u32> {
    let first = (output - 1) * stride + 1;
    first..=first + stride - 1
}
