//! Matrix panel service - wires the rship control surface, the Videohub client
//! and the routing core together.

use anyhow::Result;
use rship_sdk::{ActionArgs, EmitterArgs, InstanceArgs, SdkClient, TargetArgs};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::actions::{SetAnalogJoinAction, SetDigitalJoinAction};
use crate::client::VideohubClient;
use crate::config::Config;
use crate::connectivity::{ConnectivityMonitor, Device};
use crate::dispatcher::{Event, EventDispatcher, SignalValue};
use crate::emitters::FeedbackEmitter;
use crate::routing::CrosspointRouter;
use crate::state::RoutingState;
use crate::transport::{ChannelSurface, ChannelSwitcher, SurfaceUpdate, SwitchCommand};

const CHANNEL_CAPACITY: usize = 100;

pub struct MatrixPanelService {
    sdk_client: SdkClient,
    config: Config,
}

impl MatrixPanelService {
    pub async fn new(config: Config) -> Result<Self> {
        let sdk_client = SdkClient::init();

        Ok(Self { sdk_client, config })
    }

    pub async fn start(&self) -> Result<()> {
        log::info!("Starting matrix panel service");

        let (event_tx, event_rx) = mpsc::channel::<Event>(CHANNEL_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel::<SwitchCommand>(CHANNEL_CAPACITY);
        let (surface_tx, surface_rx) = mpsc::channel::<SurfaceUpdate>(CHANNEL_CAPACITY);

        let size = self.config.matrix;
        let state = RoutingState::shared(size);
        let router = CrosspointRouter::new(
            state.clone(),
            size,
            Arc::new(ChannelSwitcher::new(command_tx)),
            Arc::new(ChannelSurface::new(surface_tx)),
        );
        let dispatcher = EventDispatcher::new(size, router, ConnectivityMonitor::new(state));

        self.setup_rship_connection().await?;
        self.setup_rship_instance(event_tx.clone(), surface_rx).await?;
        if event_tx
            .send(Event::DeviceOnline(Device::ControlSurface))
            .await
            .is_err()
        {
            log::error!("Event dispatcher is not running");
        }

        let client = VideohubClient::new(
            self.config.videohub_host.clone(),
            self.config.videohub_port,
            size,
        );
        tokio::spawn(client.run(command_rx, event_tx));

        log::info!(
            "Service started: {}x{} matrix, {} joins per output",
            size.inputs,
            size.outputs,
            size.stride
        );
        dispatcher.run(event_rx).await;

        Ok(())
    }

    async fn setup_rship_connection(&self) -> Result<()> {
        let url = format!(
            "ws://{}:{}/myko",
            self.config.rship_address, self.config.rship_port
        );
        log::info!("Connecting to rship at: {}", url);

        self.sdk_client.set_address(Some(url));
        self.sdk_client.await_connection().await;

        log::info!("Connected to rship successfully");
        Ok(())
    }

    async fn setup_rship_instance(
        &self,
        event_tx: mpsc::Sender<Event>,
        mut surface_rx: mpsc::Receiver<SurfaceUpdate>,
    ) -> Result<()> {
        let machine_id = hostname::get()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| format!("matrix-panel-{}", std::process::id()));

        let instance = self
            .sdk_client
            .add_instance(InstanceArgs {
                name: "Matrix Panel".into(),
                short_id: "matrix-panel".into(),
                code: "matrix-panel".into(),
                service_id: "matrix-panel-service".into(),
                cluster_id: None,
                color: "#FF6B35".into(),
                machine_id,
                message: Some("Control surface for a video matrix switcher".into()),
                status: rship_sdk::InstanceStatus::Available,
            })
            .await;

        let mut target = instance
            .add_target(TargetArgs {
                name: "Control Surface".into(),
                short_id: "control-surface".into(),
                category: "video".into(),
                parent_targets: None,
            })
            .await;

        let tx_for_digital = event_tx.clone();
        let tx_for_analog = event_tx;

        target
            .add_action(
                ActionArgs::<SetDigitalJoinAction>::new(
                    "Set Digital Join".into(),
                    "set-digital-join".into(),
                ),
                move |_action, data| {
                    queue_signal(&tx_for_digital, data.join, SignalValue::Digital(data.value));
                },
            )
            .await;

        target
            .add_action(
                ActionArgs::<SetAnalogJoinAction>::new(
                    "Set Analog Join".into(),
                    "set-analog-join".into(),
                ),
                move |_action, data| {
                    queue_signal(&tx_for_analog, data.join, SignalValue::Analog(data.value));
                },
            )
            .await;

        let feedback_emitter = target
            .add_emitter(EmitterArgs::<FeedbackEmitter>::new(
                "Feedback".into(),
                "feedback".into(),
            ))
            .await;

        // Single task so feedback reaches rship in the order it was produced
        tokio::spawn(async move {
            log::info!("Feedback emission task started");

            while let Some(update) = surface_rx.recv().await {
                match update {
                    SurfaceUpdate::Digital { join, value } => {
                        if let Err(e) = feedback_emitter.pulse(FeedbackEmitter { join, value }).await {
                            log::error!("Failed to emit feedback for join {}: {}", join, e);
                        } else {
                            log::debug!("Emitted feedback: join {} = {}", join, value);
                        }
                    }
                }
            }
        });

        log::info!("rship instance and targets setup complete");
        Ok(())
    }
}

// Queued inline from the action callback so signals reach the dispatcher in arrival order
fn queue_signal(event_tx: &mpsc::Sender<Event>, join: u32, value: SignalValue) -> bool {
    match event_tx.try_send(Event::Signal { join, value }) {
        Ok(()) => true,
        Err(e) => {
            log::error!("Failed to queue signal event for join {}: {}", join, e);
            false
        }
    }
}
