use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

/// Side length of the canonical frame every photograph is resized to
pub const CANONICAL_SIZE: u32 = 128;

/// Smallest frame the descriptor set can work with (two HOG blocks per axis)
pub const MIN_SIZE: u32 = 16;

/// Canonical frame used by the normalizer and the descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureConfig {
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
}

fn default_size() -> u32 {
    CANONICAL_SIZE
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            width: CANONICAL_SIZE,
            height: CANONICAL_SIZE,
        }
    }
}

impl FeatureConfig {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let config = Self { width, height };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < MIN_SIZE || self.height < MIN_SIZE {
            return Err(FeatureError::InvalidConfig(format!(
                "canonical frame must be at least {MIN_SIZE}x{MIN_SIZE}, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}
