use thiserror::Error;

use crate::connectivity::Device;

// Failures of a routing request. None of these are retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("crosspoint out of range: input {input} / output {output} on a {inputs}x{outputs} matrix")]
    OutOfRangeIndex {
        input: u32,
        output: u32,
        inputs: u32,
        outputs: u32,
    },
    #[error("{0} is offline")]
    DeviceUnavailable(Device),
    #[error("route command rejected: {0}")]
    CommandRejected(String),
}
