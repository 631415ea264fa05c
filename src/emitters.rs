use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Emitter data for a digital feedback join driven by the controller
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FeedbackEmitter {
    // Join number (1-based)
    pub join: u32,
    // Indicator state
    pub value: bool,
}
