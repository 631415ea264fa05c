use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Action data for a digital join on the control surface (press / release)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetDigitalJoinAction {
    // Join number (1-based)
    pub join: u32,
    // true = pressed, false = released
    pub value: bool,
}

// Action data for an analog join (sliders, level controls)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetAnalogJoinAction {
    // Join number (1-based)
    pub join: u32,
    // Raw 16-bit level
    pub value: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digital_join_payload_shape() {
        let action: SetDigitalJoinAction =
            serde_json::from_str(r#"{"join": 7, "value": true}"#).unwrap();

        assert_eq!(action.join, 7);
        assert!(action.value);
    }

    #[test]
    fn analog_level_must_fit_sixteen_bits() {
        assert!(serde_json::from_str::<SetAnalogJoinAction>(r#"{"join": 1, "value": 70000}"#).is_err());
    }
}
