//! Crosspoint routing engine.
//!
//! Route requests go to the switching device; the routing table only changes
//! when the device reports what it actually did. The engine's view of the
//! matrix is therefore always the device's view.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::connectivity::Device;
use crate::error::RouteError;
use crate::feedback::FeedbackSynchronizer;
use crate::join::Crosspoint;
use crate::state::{MatrixSize, SharedState};
use crate::transport::{ControlSurface, SwitchingDevice};

#[derive(Clone)]
pub struct CrosspointRouter {
    state: SharedState,
    switcher: Arc<dyn SwitchingDevice>,
    surface: Arc<dyn ControlSurface>,
    feedback: FeedbackSynchronizer,
}

impl CrosspointRouter {
    pub fn new(
        state: SharedState,
        size: MatrixSize,
        switcher: Arc<dyn SwitchingDevice>,
        surface: Arc<dyn ControlSurface>,
    ) -> Self {
        Self {
            state,
            switcher,
            surface,
            feedback: FeedbackSynchronizer::new(size.stride),
        }
    }

    /// Asks the switcher to feed `output` from `input`.
    ///
    /// # Errors
    ///
    /// [`RouteError::OutOfRangeIndex`] or [`RouteError::DeviceUnavailable`] before any
    /// device call, [`RouteError::CommandRejected`] when the hand-off itself fails.
    pub async fn apply_route(&self, input: u32, output: u32) -> Result<(), RouteError> {
        {
            let state = self.state.lock().await;
            let size = state.size;
            if !size.contains(input, output) {
                return Err(RouteError::OutOfRangeIndex {
                    input,
                    output,
                    inputs: size.inputs,
                    outputs: size.outputs,
                });
            }
            if !state.is_online(Device::Switcher) {
                return Err(RouteError::DeviceUnavailable(Device::Switcher));
            }
        }

        log::info!("Switching input {} to output {}", input, output);
        self.switcher
            .request_route(input, output)
            .await
            .map_err(RouteError::CommandRejected)
    }

    // Device confirmation: `output` is now fed by `input` (`None` = unrouted)
    pub async fn record_actual_route(&self, output: u32, input: Option<u32>) {
        // Held across the feedback writes so two reports for one output cannot interleave
        let mut state = self.state.lock().await;
        let size = state.size;
        let input_in_range = input.is_none_or(|input| (1..=size.inputs).contains(&input));
        if !(1..=size.outputs).contains(&output) || !input_in_range {
            log::warn!(
                "Ignoring route report outside the {}x{} matrix: input {:?} to output {}",
                size.inputs,
                size.outputs,
                input,
                output
            );
            return;
        }
        state.routes.insert(output, input);

        match input {
            Some(input) => log::info!("Switched input {} to output {}", input, output),
            None => log::info!("Output {} is unrouted", output),
        }

        self.feedback.sync(self.surface.as_ref(), output, input).await;
    }

    pub async fn record_video_detected(&self, input: u32, present: bool) {
        let mut state = self.state.lock().await;
        state.video_detected.insert(input, present);

        if present {
            log::info!("Video detected on input {}", input);
        } else {
            log::debug!("Video lost on input {}", input);
        }
    }

    pub async fn active_input(&self, output: u32) -> Option<u32> {
        self.state.lock().await.active_input(output)
    }

    pub async fn video_detected(&self, input: u32) -> bool {
        self.state
            .lock()
            .await
            .video_detected
            .get(&input)
            .copied()
            .unwrap_or(false)
    }

    // Current crosspoints ordered by output; unrouted outputs are left out
    pub async fn snapshot(&self) -> Vec<Crosspoint> {
        let routes: BTreeMap<u32, Option<u32>> = self.state.lock().await.routes.clone();
        routes
            .into_iter()
            .filter_map(|(output, input)| input.map(|input| Crosspoint::new(input, output)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RoutingState;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ── Test doubles ──────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingSwitcher {
        routes: Mutex<Vec<(u32, u32)>>,
        should_fail: bool,
    }

    #[async_trait]
    impl SwitchingDevice for RecordingSwitcher {
        async fn request_route(&self, input: u32, output: u32) -> Result<(), String> {
            if self.should_fail {
                return Err("injected failure".to_string());
            }
            self.routes.lock().unwrap().push((input, output));
            Ok(())
        }
    }

    #[derive(Default)]
    struct PanelSurface {
        joins: Mutex<BTreeMap<u32, bool>>,
    }

    impl PanelSurface {
        fn lit(&self) -> Vec<u32> {
            self.joins
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, v)| **v)
                .map(|(j, _)| *j)
                .collect()
        }
    }

    #[async_trait]
    impl ControlSurface for PanelSurface {
        async fn set_boolean(&self, join: u32, value: bool) -> Result<(), String> {
            self.joins.lock().unwrap().insert(join, value);
            Ok(())
        }
    }

    struct Fixture {
        router: CrosspointRouter,
        state: SharedState,
        switcher: Arc<RecordingSwitcher>,
        surface: Arc<PanelSurface>,
    }

    fn fixture_with(switcher: RecordingSwitcher) -> Fixture {
        let size = MatrixSize::new(4, 4);
        let state = RoutingState::shared(size);
        let switcher = Arc::new(switcher);
        let surface = Arc::new(PanelSurface::default());
        let router = CrosspointRouter::new(state.clone(), size, switcher.clone(), surface.clone());
        Fixture {
            router,
            state,
            switcher,
            surface,
        }
    }

    async fn online_fixture() -> Fixture {
        let fixture = fixture_with(RecordingSwitcher::default());
        fixture.state.lock().await.online.insert(Device::Switcher, true);
        fixture
    }

    // ── apply_route ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn apply_route_issues_command_without_touching_table() {
        let f = online_fixture().await;

        f.router.apply_route(3, 2).await.unwrap();

        assert_eq!(*f.switcher.routes.lock().unwrap(), vec![(3, 2)]);
        assert_eq!(f.router.active_input(2).await, None);
        assert!(f.surface.lit().is_empty());
    }

    #[tokio::test]
    async fn apply_route_rejects_output_beyond_matrix() {
        let f = online_fixture().await;

        let err = f.router.apply_route(1, 5).await.unwrap_err();

        assert!(matches!(err, RouteError::OutOfRangeIndex { output: 5, .. }));
        assert!(f.switcher.routes.lock().unwrap().is_empty());
        assert!(f.state.lock().await.routes.is_empty());
    }

    #[tokio::test]
    async fn apply_route_rejects_input_zero() {
        let f = online_fixture().await;

        let err = f.router.apply_route(0, 1).await.unwrap_err();

        assert!(matches!(err, RouteError::OutOfRangeIndex { input: 0, .. }));
    }

    #[tokio::test]
    async fn apply_route_fails_fast_when_switcher_offline() {
        let f = fixture_with(RecordingSwitcher::default());

        let err = f.router.apply_route(1, 1).await.unwrap_err();

        assert_eq!(err, RouteError::DeviceUnavailable(Device::Switcher));
        assert!(f.switcher.routes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_command_is_reported_and_leaves_state_alone() {
        let f = fixture_with(RecordingSwitcher {
            should_fail: true,
            ..Default::default()
        });
        f.state.lock().await.online.insert(Device::Switcher, true);

        let err = f.router.apply_route(2, 2).await.unwrap_err();

        assert!(matches!(err, RouteError::CommandRejected(_)));
        assert_eq!(f.router.active_input(2).await, None);
        assert!(f.surface.lit().is_empty());
    }

    // ── record_actual_route ───────────────────────────────────────────────────

    #[tokio::test]
    async fn reported_route_lights_single_indicator() {
        let f = online_fixture().await;

        f.router.record_actual_route(2, Some(3)).await;

        assert_eq!(f.router.active_input(2).await, Some(3));
        assert_eq!(f.surface.lit(), vec![7]);
        let joins = f.surface.joins.lock().unwrap().clone();
        for join in [5, 6, 8] {
            assert_eq!(joins.get(&join), Some(&false));
        }
    }

    #[tokio::test]
    async fn second_report_replaces_first_indicator() {
        let f = online_fixture().await;

        f.router.record_actual_route(2, Some(3)).await;
        f.router.record_actual_route(2, Some(1)).await;

        assert_eq!(f.router.active_input(2).await, Some(1));
        assert_eq!(f.surface.lit(), vec![5]);
    }

    #[tokio::test]
    async fn reports_for_other_outputs_do_not_disturb_feedback() {
        let f = online_fixture().await;

        f.router.record_actual_route(1, Some(4)).await;
        f.router.record_actual_route(3, Some(2)).await;

        assert_eq!(f.surface.lit(), vec![4, 10]);
        assert_eq!(
            f.router.snapshot().await,
            vec![Crosspoint::new(4, 1), Crosspoint::new(2, 3)]
        );
    }

    #[tokio::test]
    async fn unrouted_report_clears_output() {
        let f = online_fixture().await;

        f.router.record_actual_route(1, Some(2)).await;
        f.router.record_actual_route(1, None).await;

        assert!(f.surface.lit().is_empty());
        assert_eq!(f.router.active_input(1).await, None);
        assert!(f.router.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn reports_outside_matrix_are_dropped() {
        let f = online_fixture().await;

        f.router.record_actual_route(12, Some(3)).await;
        f.router.record_actual_route(0, Some(1)).await;
        f.router.record_actual_route(2, Some(5)).await;
        f.router.record_actual_route(2, Some(0)).await;

        assert!(f.state.lock().await.routes.is_empty());
        assert!(f.surface.joins.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn report_outside_matrix_keeps_previous_route() {
        let f = online_fixture().await;
        f.router.record_actual_route(2, Some(3)).await;

        f.router.record_actual_route(5, None).await;

        assert_eq!(f.router.active_input(2).await, Some(3));
        assert_eq!(f.surface.lit(), vec![7]);
    }

    #[tokio::test]
    async fn reports_are_recorded_while_switcher_offline() {
        let f = fixture_with(RecordingSwitcher::default());

        f.router.record_actual_route(4, Some(4)).await;

        assert_eq!(f.router.active_input(4).await, Some(4));
    }

    // ── record_video_detected ─────────────────────────────────────────────────

    #[tokio::test]
    async fn video_detection_never_changes_routes() {
        let f = online_fixture().await;
        f.router.record_actual_route(1, Some(2)).await;
        let before = f.state.lock().await.routes.clone();

        f.router.record_video_detected(2, true).await;
        f.router.record_video_detected(3, false).await;

        assert_eq!(f.state.lock().await.routes, before);
        assert!(f.router.video_detected(2).await);
        assert!(!f.router.video_detected(3).await);
    }

    #[tokio::test]
    async fn video_detection_tracks_last_report() {
        let f = online_fixture().await;

        f.router.record_video_detected(1, true).await;
        f.router.record_video_detected(1, false).await;

        assert!(!f.router.video_detected(1).await);
        assert!(f.state.lock().await.routes.is_empty());
    }
}
