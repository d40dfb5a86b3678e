use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Thresholds of the decision rules, in percent except for the entropy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FusionConfig {
    /// Shannon entropy (bits) above which the outcome is reported as mixed
    pub entropy_threshold: f64,
    /// Top confidence at or above which the top class is returned directly
    pub dominant_percent: f64,
    /// Combined confidence required for rain with fog
    pub rain_fog_percent: f64,
    /// Third-place ceiling for a sunshower, also the floor for naming a
    /// secondary influence
    pub minor_percent: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            entropy_threshold: 1.6,
            dominant_percent: 75.0,
            rain_fog_percent: 70.0,
            minor_percent: 15.0,
        }
    }
}
