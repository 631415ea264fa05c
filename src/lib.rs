//! # rship-matrix-panel
//!
//! rship executor that keeps a touch-panel style control surface in sync with
//! a video matrix switcher.
//!
//! Digital joins on the surface select crosspoints: join
//! `input + (output - 1) * stride` routes `input` to `output`. Routes reported
//! by the switcher come back as mutually exclusive indicator joins in the same
//! layout.

pub mod actions;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod dispatcher;
pub mod emitters;
pub mod error;
pub mod feedback;
pub mod join;
pub mod routing;
pub mod service;
pub mod state;
pub mod transport;

// Re-export the main service and commonly used types
pub use actions::{SetAnalogJoinAction, SetDigitalJoinAction};
pub use config::Config;
pub use connectivity::{ConnectivityMonitor, Device};
pub use dispatcher::{Event, EventDispatcher, SignalValue};
pub use emitters::FeedbackEmitter;
pub use error::RouteError;
pub use join::Crosspoint;
pub use routing::CrosspointRouter;
pub use service::MatrixPanelService;
pub use state::{MatrixSize, RoutingState, SharedState};
pub use transport::{ControlSurface, SwitchingDevice};
