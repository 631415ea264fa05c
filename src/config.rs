use anyhow::{Result, bail};
use std::env;
use std::str::FromStr;

use crate::state::MatrixSize;

// Defaults match an 8x8 matrix with an 8-wide join block per output
const DEFAULT_INPUTS: u32 = 8;
const DEFAULT_OUTPUTS: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub videohub_host: String,
    pub videohub_port: u16,
    pub rship_address: String,
    pub rship_port: String,
    pub matrix: MatrixSize,
}

impl Config {
    // Reads configuration from the process environment (after `.env` is loaded)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let videohub_host = lookup("VIDEOHUB_HOST").unwrap_or_else(|| "localhost".to_string());
        let videohub_port = parse_or(&lookup, "VIDEOHUB_PORT", 9990u16);
        let rship_address = lookup("RSHIP_ADDRESS").unwrap_or_else(|| "nyc.rship.io".to_string());
        let rship_port = lookup("RSHIP_PORT").unwrap_or_else(|| "5155".to_string());

        let inputs = parse_or(&lookup, "MATRIX_INPUTS", DEFAULT_INPUTS);
        let outputs = parse_or(&lookup, "MATRIX_OUTPUTS", DEFAULT_OUTPUTS);
        let stride = parse_or(&lookup, "JOIN_STRIDE", outputs);

        if inputs == 0 || outputs == 0 {
            bail!("Matrix must have at least one input and one output ({}x{})", inputs, outputs);
        }
        if stride < inputs {
            bail!(
                "JOIN_STRIDE {} is smaller than MATRIX_INPUTS {}; each output needs one join per input",
                stride,
                inputs
            );
        }

        Ok(Self {
            videohub_host,
            videohub_port,
            rship_address,
            rship_port,
            matrix: MatrixSize::new(inputs, outputs).with_stride(stride),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
