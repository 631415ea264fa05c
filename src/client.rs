//! Switching-device transport: a Blackmagic Videohub over TCP.
//!
//! The Videohub protocol numbers ports from 0; everything leaving this module
//! uses the controller's 1-based crosspoints.

use anyhow::{Result, anyhow};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tokio_util::codec::Framed;
use videohub::{DeviceInfo, Route, VideohubCodec, VideohubMessage};

use crate::connectivity::Device;
use crate::dispatcher::Event;
use crate::state::MatrixSize;
use crate::transport::SwitchCommand;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

// Last state reported by the device, in protocol (0-based) numbering
#[derive(Debug, Clone, Default)]
pub struct VideohubState {
    pub device_info: Option<DeviceInfo>,
    pub video_output_routing: HashMap<u32, u32>, // output -> input
}

// Client for communicating with a Blackmagic Videohub device
pub struct VideohubClient {
    host: String,
    port: u16,
    matrix: MatrixSize,
    state: VideohubState,
    connection: Option<Framed<TcpStream, VideohubCodec>>,
}

impl VideohubClient {
    pub fn new(host: String, port: u16, matrix: MatrixSize) -> Self {
        Self {
            host,
            port,
            matrix,
            state: VideohubState::default(),
            connection: None,
        }
    }

    pub async fn connect(&mut self) -> Result<()> {
        log::debug!("Connecting to videohub at {}:{}", self.host, self.port);

        let stream = TcpStream::connect(format!("{}:{}", self.host, self.port)).await?;
        self.connection = Some(Framed::new(stream, VideohubCodec));
        // The device dumps its full routing on connect; start from a clean slate
        self.state.video_output_routing.clear();

        log::debug!("Connected to videohub successfully");
        Ok(())
    }

    pub fn state(&self) -> &VideohubState {
        &self.state
    }

    async fn send_message(&mut self, message: VideohubMessage) -> Result<()> {
        if let Some(conn) = &mut self.connection {
            conn.send(message)
                .await
                .map_err(|e| anyhow!("Failed to send message: {}", e))?;
            Ok(())
        } else {
            Err(anyhow!("Not connected to videohub"))
        }
    }

    // Receive the next message; `Ok(None)` once the device closes the connection
    async fn receive_message(&mut self) -> Result<Option<VideohubMessage>> {
        if let Some(conn) = &mut self.connection {
            match conn.next().await {
                Some(Ok(message)) => Ok(Some(message)),
                Some(Err(e)) => Err(anyhow!("Failed to receive message: {}", e)),
                None => {
                    self.connection = None;
                    Ok(None)
                }
            }
        } else {
            Err(anyhow!("Not connected to videohub"))
        }
    }

    /// Sends a route using 1-based ports.
    pub async fn set_route(&mut self, input: u32, output: u32) -> Result<()> {
        log::debug!("Sending route: input {} -> output {}", input, output);

        let route = Route {
            to_output: output.saturating_sub(1),
            from_input: input.saturating_sub(1),
        };
        self.send_message(VideohubMessage::VideoOutputRouting(vec![route]))
            .await
    }

    // Folds a message into the state and returns the controller events it implies
    pub fn handle_message(&mut self, message: &VideohubMessage) -> Vec<Event> {
        match message {
            VideohubMessage::DeviceInfo(info) => {
                if self.state.device_info.as_ref() != Some(info) {
                    log::info!(
                        "Device connected: {} | Inputs: {} | Outputs: {} | ID: {}",
                        info.model_name.as_deref().unwrap_or("Unknown"),
                        info.video_inputs.unwrap_or(0),
                        info.video_outputs.unwrap_or(0),
                        info.unique_id.as_deref().unwrap_or("Unknown")
                    );
                    if matrix_mismatch(info.video_inputs, info.video_outputs, &self.matrix) {
                        log::warn!(
                            "Videohub reports {}x{} but the panel is configured for {}x{}; set MATRIX_INPUTS / MATRIX_OUTPUTS to match",
                            info.video_inputs.unwrap_or(0),
                            info.video_outputs.unwrap_or(0),
                            self.matrix.inputs,
                            self.matrix.outputs
                        );
                    }
                    self.state.device_info = Some(info.clone());
                }
                Vec::new()
            }
            VideohubMessage::VideoOutputRouting(routes) => {
                log::debug!("Received video output routing: {} routes", routes.len());
                let mut events = Vec::new();
                for route in routes {
                    let previous = self
                        .state
                        .video_output_routing
                        .insert(route.to_output, route.from_input);
                    if previous != Some(route.from_input) {
                        events.push(Event::OutputChanged {
                            output: route.to_output + 1,
                            input: Some(route.from_input + 1),
                        });
                    }
                }
                events
            }
            VideohubMessage::ACK => {
                log::debug!("Received ACK");
                Vec::new()
            }
            VideohubMessage::NAK => {
                log::warn!("Received NAK");
                Vec::new()
            }
            _ => {
                log::debug!("Received unhandled message: {:?}", message);
                Vec::new()
            }
        }
    }

    // Owns the connection: forwards commands, reports device events, reconnects on drop
    pub async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<SwitchCommand>,
        event_tx: mpsc::Sender<Event>,
    ) {
        log::info!("Videohub client task started");

        loop {
            if let Err(e) = self.connect().await {
                log::error!("Failed to connect to videohub: {}", e);
                sleep(RECONNECT_DELAY).await;
                continue;
            }
            if event_tx.send(Event::DeviceOnline(Device::Switcher)).await.is_err() {
                return;
            }

            loop {
                tokio::select! {
                    command = command_rx.recv() => {
                        match command {
                            Some(SwitchCommand::Route { input, output }) => {
                                if let Err(e) = self.set_route(input, output).await {
                                    log::error!("Failed to set route: {}", e);
                                }
                            }
                            None => {
                                log::info!("Command channel closed, stopping videohub client");
                                return;
                            }
                        }
                    }
                    message_result = self.receive_message() => {
                        match message_result {
                            Ok(Some(message)) => {
                                for event in self.handle_message(&message) {
                                    if event_tx.send(event).await.is_err() {
                                        return;
                                    }
                                }
                            }
                            Ok(None) => {
                                log::warn!("Videohub connection closed, attempting to reconnect...");
                                break;
                            }
                            Err(e) => {
                                log::error!("Error receiving videohub message: {}", e);
                                self.connection = None;
                                break;
                            }
                        }
                    }
                }
            }

            if event_tx.send(Event::DeviceOffline(Device::Switcher)).await.is_err() {
                return;
            }
            sleep(RECONNECT_DELAY).await;
        }
    }
}

// True when the device states a port count that differs from the configured matrix
pub fn matrix_mismatch(
    video_inputs: Option<u32>,
    video_outputs: Option<u32>,
    matrix: &MatrixSize,
) -> bool {
    video_inputs.is_some_and(|n| n != matrix.inputs)
        || video_outputs.is_some_and(|n| n != matrix.outputs)
}
