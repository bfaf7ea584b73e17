//! Engine configuration, loaded from TOML.
//!
//! Every section has defaults, so an empty file (or no file) is a valid
//! configuration.

use crate::bias::BiasConfig;
use crate::constitution::Constitution;
use crate::drop_bridge::DropBridgeConfig;
use crate::energy::EnergyZoneConfig;
use crate::error::{CoreError, Result};
use crate::gatekeeper::Mood;
use crate::hunt::HuntConfig;
use crate::logging::LogConfig;
use crate::memory::MemoryConfig;
use crate::types::Vibe;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Orchestrator tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsciousConfig {
    /// Master switch; a disabled engine repeats its last output
    pub enabled: bool,
    /// Energy above which the physics override short-circuits the pipeline
    pub energy_override_threshold: f32,
    /// Confidence an output needs to count as applied
    pub min_confidence: f32,
    /// Worthiness that triggers a dream simulation
    pub dream_worthiness_threshold: f32,
    /// Deadline of the dream race
    pub dream_deadline_ms: u64,
    /// Prediction probability reported in debug output
    pub prediction_report_threshold: f32,
    /// Samples of the trailing energy trend
    pub energy_trend_window: usize,
    /// Frames between bias analyses
    pub bias_analysis_interval: u64,
    /// Frames between periodic status logs
    pub log_interval_frames: u64,
}

impl Default for ConsciousConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            energy_override_threshold: 0.85,
            min_confidence: 0.60,
            dream_worthiness_threshold: 0.65,
            dream_deadline_ms: 15,
            prediction_report_threshold: 0.25,
            energy_trend_window: 15,
            bias_analysis_interval: 30,
            log_interval_frames: 60,
        }
    }
}

/// Initial session policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Starting vibe
    pub vibe: Vibe,
    /// Starting mood
    pub mood: Mood,
    /// Colour rules
    pub constitution: Constitution,
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Orchestrator
    pub engine: ConsciousConfig,
    /// Hunt engine
    pub hunt: HuntConfig,
    /// Drop bridge
    pub drop_bridge: DropBridgeConfig,
    /// Bias detector
    pub bias: BiasConfig,
    /// Energy zones
    pub energy: EnergyZoneConfig,
    /// Z-score memory
    pub memory: MemoryConfig,
    /// Vibe, mood and constitution
    pub session: SessionConfig,
    /// Logging
    pub log: LogConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> Result<()> {
        let unit = [
            ("engine.energy_override_threshold", self.engine.energy_override_threshold),
            ("engine.min_confidence", self.engine.min_confidence),
            ("engine.dream_worthiness_threshold", self.engine.dream_worthiness_threshold),
            ("engine.prediction_report_threshold", self.engine.prediction_report_threshold),
            ("hunt.beauty_threshold", self.hunt.beauty_threshold),
            ("hunt.consonance_threshold", self.hunt.consonance_threshold),
            ("hunt.urgency_force_threshold", self.hunt.urgency_force_threshold),
            ("hunt.wake_threshold", self.hunt.wake_threshold),
            ("drop_bridge.min_energy", self.drop_bridge.min_energy),
            ("bias.hue_preference_threshold", self.bias.hue_preference_threshold),
            ("bias.risk_aversion_threshold", self.bias.risk_aversion_threshold),
            ("bias.strategy_lock_threshold", self.bias.strategy_lock_threshold),
            ("bias.min_healthy_change_rate", self.bias.min_healthy_change_rate),
            ("bias.max_healthy_change_rate", self.bias.max_healthy_change_rate),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::InvalidParameter(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.bias.min_healthy_change_rate >= self.bias.max_healthy_change_rate {
            return Err(CoreError::InvalidParameter(
                "bias.min_healthy_change_rate must be below bias.max_healthy_change_rate".into(),
            ));
        }
        if self.drop_bridge.watching_threshold > self.drop_bridge.imminent_threshold
            || self.drop_bridge.imminent_threshold > self.drop_bridge.z_score_threshold
        {
            return Err(CoreError::InvalidParameter(
                "drop_bridge thresholds must satisfy watching <= imminent <= z_score".into(),
            ));
        }
        if self.hunt.min_stalking_frames > self.hunt.max_stalking_frames {
            return Err(CoreError::InvalidParameter(
                "hunt.min_stalking_frames exceeds hunt.max_stalking_frames".into(),
            ));
        }
        if self.memory.buffer_size < self.memory.min_samples || self.memory.min_samples < 2 {
            return Err(CoreError::InvalidParameter(
                "memory.buffer_size must hold at least memory.min_samples (>= 2)".into(),
            ));
        }
        if self.bias.window_size < 10 {
            return Err(CoreError::InvalidParameter(
                "bias.window_size must be at least 10".into(),
            ));
        }
        if self.engine.energy_trend_window == 0 || self.engine.bias_analysis_interval == 0 {
            return Err(CoreError::Config(
                "engine windows and intervals must be non-zero".into(),
            ));
        }
        for &(min, max) in &self.session.constitution.forbidden_hue_ranges {
            if !(0.0..=360.0).contains(&min) || !(0.0..=360.0).contains(&max) {
                return Err(CoreError::InvalidParameter(format!(
                    "forbidden hue range [{}, {}] outside [0, 360]",
                    min, max
                )));
            }
        }
        Ok(())
    }
}
