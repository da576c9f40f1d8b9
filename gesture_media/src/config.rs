//! Application configuration.
//!
//! Stored as JSON.  Every field is optional in the file; missing fields
//! take the defaults below, which match the tuned values of the hand-held
//! prototype (1 s play/pause debounce, 30 px pinch, 20 px drag step).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hand_gesture::ClassifierConfig;

use crate::action::ControlMode;
use crate::controller::ControllerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Key layout the sink presses.
    pub mode:       ControlMode,
    pub classifier: ClassifierConfig,
    pub controller: ControllerConfig,
}

impl AppConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject thresholds that would make a gesture impossible or constant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.controller;
        let durations = [
            ("toggle_debounce_secs", c.toggle_debounce_secs),
            ("continuous_cooldown_secs", c.continuous_cooldown_secs),
        ];
        for (name, v) in durations {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, v
                )));
            }
        }
        if !c.mute_threshold_px.is_finite() || c.mute_threshold_px <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "mute_threshold_px must be positive, got {}",
                c.mute_threshold_px
            )));
        }
        if c.move_threshold_px <= 0 {
            return Err(ConfigError::Invalid(format!(
                "move_threshold_px must be positive, got {}",
                c.move_threshold_px
            )));
        }

        let k = &self.classifier;
        if !k.seek_merge_px.is_finite() || k.seek_merge_px <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "seek_merge_px must be positive, got {}",
                k.seek_merge_px
            )));
        }
        if let Some((w, h)) = k.frame {
            if w == 0 || h == 0 {
                return Err(ConfigError::Invalid(format!("frame {}x{} is empty", w, h)));
            }
        }
        Ok(())
    }
}
