//! Drop bridge: statistical override for rare extreme moments.
//!
//! When the energy z-score, the section and the absolute energy all line up,
//! the bridge forces a strike regardless of what the hunt or the fuzzy
//! evaluator think. The stateful wrapper adds a cooldown between activations.

use crate::types::SectionType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consecutive frames at or above the imminent threshold for "high alert"
const HIGH_Z_PERSISTENCE: u32 = 3;

/// Tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropBridgeConfig {
    /// Minimum z-score to fire
    pub z_score_threshold: f32,
    /// Sections that count as a peak
    pub peak_sections: Vec<SectionType>,
    /// Minimum raw energy to fire
    pub min_energy: f32,
    /// Require a kick on the frame
    pub require_kick: bool,
    /// Z-score for the "watching" alert
    pub watching_threshold: f32,
    /// Z-score for the "imminent" alert
    pub imminent_threshold: f32,
    /// Minimum time between activations
    pub cooldown_ms: u64,
}

impl Default for DropBridgeConfig {
    fn default() -> Self {
        Self {
            z_score_threshold: 3.0,
            peak_sections: vec![SectionType::Drop, SectionType::Chorus],
            min_energy: 0.60,
            require_kick: false,
            watching_threshold: 2.0,
            imminent_threshold: 2.5,
            cooldown_ms: 2000,
        }
    }
}

/// Input for one check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropBridgeInput {
    /// Energy z-score
    pub energy_z_score: f32,
    /// Current section
    pub section: SectionType,
    /// Raw energy (0..1)
    pub raw_energy: f32,
    /// Kick on this frame
    pub has_kick: bool,
    /// Spectral harshness, if known
    pub harshness: Option<f32>,
}

/// How close the bridge is to firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    /// Nothing going on
    #[default]
    None,
    /// z at or above the watching threshold
    Watching,
    /// z at or above the imminent threshold, or suppressed by cooldown
    Imminent,
    /// Force strike issued
    Activated,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertLevel::None => "none",
            AlertLevel::Watching => "watching",
            AlertLevel::Imminent => "imminent",
            AlertLevel::Activated => "activated",
        })
    }
}

/// Debug metrics of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropBridgeMetrics {
    /// Z-score evaluated
    pub z_score: f32,
    /// Section evaluated
    pub section: SectionType,
    /// Energy evaluated
    pub energy: f32,
    /// Z threshold in use
    pub threshold: f32,
    /// Conditions that held
    pub conditions_met: Vec<String>,
}

/// Verdict of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropBridgeResult {
    /// Force a strike this frame
    pub should_force_strike: bool,
    /// Strike intensity, 0 when not firing
    pub intensity: f32,
    /// Human-readable reason
    pub reason: String,
    /// Alert level
    pub alert_level: AlertLevel,
    /// Debug metrics
    pub metrics: DropBridgeMetrics,
}

/// Stateless evaluation of the divine condition.
pub fn check_drop_bridge(input: &DropBridgeInput, config: &DropBridgeConfig) -> DropBridgeResult {
    let mut conditions_met = Vec::new();

    let epic_z = input.energy_z_score >= config.z_score_threshold;
    if epic_z {
        conditions_met.push(format!(
            "z={:.2}>={}",
            input.energy_z_score, config.z_score_threshold
        ));
    }
    let peak_section = config.peak_sections.contains(&input.section);
    if peak_section {
        conditions_met.push(format!("section={} in peak", input.section.as_str()));
    }
    let min_energy = input.raw_energy >= config.min_energy;
    if min_energy {
        conditions_met.push(format!("E={:.2}>={}", input.raw_energy, config.min_energy));
    }
    let kick_ok = !config.require_kick || input.has_kick;
    if input.has_kick {
        conditions_met.push("KICK".to_string());
    }

    let should_force_strike = epic_z && peak_section && min_energy && kick_ok;

    let mut intensity = 0.0;
    if should_force_strike {
        let excess = input.energy_z_score - config.z_score_threshold;
        intensity = (0.85 + excess * 0.15).min(1.0);
        if input.has_kick {
            intensity = (intensity + 0.05).min(1.0);
        }
        if input.harshness.is_some_and(|h| h > 0.7) {
            intensity = (intensity + 0.03).min(1.0);
        }
    }

    let alert_level = if should_force_strike {
        AlertLevel::Activated
    } else if input.energy_z_score >= config.imminent_threshold {
        AlertLevel::Imminent
    } else if input.energy_z_score >= config.watching_threshold {
        AlertLevel::Watching
    } else {
        AlertLevel::None
    };

    let reason = if should_force_strike {
        format!("DROP BRIDGE ACTIVATED: {} -> FORCE_STRIKE", conditions_met.join(" + "))
    } else {
        let mut missing = Vec::new();
        if !epic_z {
            missing.push(format!(
                "z={:.2}<{}",
                input.energy_z_score, config.z_score_threshold
            ));
        }
        if !peak_section {
            missing.push(format!("section={} not peak", input.section.as_str()));
        }
        if missing.is_empty() {
            format!("Drop bridge: conditions partially met [{}]", conditions_met.join(", "))
        } else {
            format!("Drop bridge inactive: missing {}", missing.join(", "))
        }
    };

    DropBridgeResult {
        should_force_strike,
        intensity,
        reason,
        alert_level,
        metrics: DropBridgeMetrics {
            z_score: input.energy_z_score,
            section: input.section,
            energy: input.raw_energy,
            threshold: config.z_score_threshold,
            conditions_met,
        },
    }
}

/// Drop bridge with activation cooldown and persistence tracking.
#[derive(Debug, Clone, Default)]
pub struct DropBridge {
    config: DropBridgeConfig,
    last_activation_ms: Option<u64>,
    consecutive_high_z: u32,
}

impl DropBridge {
    /// Create a bridge with the given configuration
    pub fn new(config: DropBridgeConfig) -> Self {
        Self {
            config,
            last_activation_ms: None,
            consecutive_high_z: 0,
        }
    }

    /// Evaluate one frame at `now_ms`, applying the cooldown.
    pub fn check(&mut self, input: &DropBridgeInput, now_ms: u64) -> DropBridgeResult {
        if input.energy_z_score >= self.config.imminent_threshold {
            self.consecutive_high_z += 1;
        } else {
            self.consecutive_high_z = 0;
        }

        let mut result = check_drop_bridge(input, &self.config);
        if !result.should_force_strike {
            return result;
        }

        if let Some(last) = self.last_activation_ms {
            let elapsed = now_ms.saturating_sub(last);
            if elapsed < self.config.cooldown_ms {
                let remaining = self.config.cooldown_ms - elapsed;
                result.should_force_strike = false;
                result.alert_level = AlertLevel::Imminent;
                result.intensity = 0.0;
                result.reason = format!(
                    "{} [COOLDOWN {:.1}s remaining]",
                    result.reason,
                    remaining as f64 / 1000.0
                );
                return result;
            }
        }

        self.last_activation_ms = Some(now_ms);
        result
    }

    /// Consecutive frames at or above the imminent threshold
    pub fn consecutive_high_z_scores(&self) -> u32 {
        self.consecutive_high_z
    }

    /// Several consecutive frames with a high z-score
    pub fn is_high_alert(&self) -> bool {
        self.consecutive_high_z >= HIGH_Z_PERSISTENCE
    }

    /// Time since the last activation, `None` if it never fired
    pub fn time_since_last_activation(&self, now_ms: u64) -> Option<u64> {
        self.last_activation_ms
            .map(|last| now_ms.saturating_sub(last))
    }

    /// Current configuration
    pub fn config(&self) -> &DropBridgeConfig {
        &self.config
    }

    /// Replace the configuration; state is kept
    pub fn update_config(&mut self, config: DropBridgeConfig) {
        self.config = config;
    }

    /// Forget activations (new song)
    pub fn reset(&mut self) {
        self.last_activation_ms = None;
        self.consecutive_high_z = 0;
    }
}

/// Right-tail probability of a standard normal z-score.
pub fn z_score_to_probability(z: f32) -> f64 {
    // Abramowitz and Stegun 7.1.26
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let z = f64::from(z);
    let x = z.abs() / std::f64::consts::SQRT_2;
    let t = 1.0 / (1.0 + P * x);
    let erf = 1.0 - ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    let cdf = 0.5 * (1.0 + if z >= 0.0 { erf } else { -erf });
    1.0 - cdf
}

/// Human-readable rarity of a z-score
pub fn describe_z_score(z: f32) -> &'static str {
    let abs = z.abs();
    if abs < 1.0 {
        "Normal (68%)"
    } else if abs < 1.5 {
        "Slightly unusual"
    } else if abs < 2.0 {
        "Unusual (5%)"
    } else if abs < 2.5 {
        "Notable (2.5%)"
    } else if abs < 3.0 {
        "Very rare (1%)"
    } else if abs < 3.5 {
        "EXTREME (0.3%)"
    } else {
        "EPIC (0.05%)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(z: f32, section: SectionType, energy: f32) -> DropBridgeInput {
        DropBridgeInput {
            energy_z_score: z,
            section,
            raw_energy: energy,
            has_kick: false,
            harshness: None,
        }
    }

    #[test]
    fn test_epic_drop_fires() {
        let r = check_drop_bridge(&input(4.2, SectionType::Drop, 0.63), &Default::default());
        assert!(r.should_force_strike);
        assert_eq!(r.alert_level, AlertLevel::Activated);
        assert_eq!(r.intensity, 1.0);
    }

    #[test]
    fn test_below_threshold_does_not_fire() {
        let r = check_drop_bridge(&input(2.6, SectionType::Drop, 0.63), &Default::default());
        assert!(!r.should_force_strike);
        assert_eq!(r.alert_level, AlertLevel::Imminent);
        assert_eq!(r.intensity, 0.0);
        assert!(r.reason.contains("missing"));
    }

    #[test]
    fn test_wrong_section_or_energy() {
        let cfg = DropBridgeConfig::default();
        assert!(!check_drop_bridge(&input(4.0, SectionType::Verse, 0.9), &cfg).should_force_strike);
        assert!(!check_drop_bridge(&input(4.0, SectionType::Drop, 0.4), &cfg).should_force_strike);
    }

    #[test]
    fn test_intensity_bonuses() {
        let mut i = input(3.0, SectionType::Chorus, 0.8);
        let base = check_drop_bridge(&i, &Default::default()).intensity;
        assert!((base - 0.85).abs() < 1e-6);
        i.has_kick = true;
        i.harshness = Some(0.8);
        let boosted = check_drop_bridge(&i, &Default::default()).intensity;
        assert!((boosted - 0.93).abs() < 1e-5);
    }

    #[test]
    fn test_require_kick() {
        let cfg = DropBridgeConfig {
            require_kick: true,
            ..Default::default()
        };
        assert!(!check_drop_bridge(&input(3.5, SectionType::Drop, 0.9), &cfg).should_force_strike);
    }

    #[test]
    fn test_cooldown_suppresses_reactivation() {
        let mut bridge = DropBridge::default();
        let epic = input(4.2, SectionType::Drop, 0.63);
        assert!(bridge.check(&epic, 10_000).should_force_strike);

        let suppressed = bridge.check(&epic, 11_500);
        assert!(!suppressed.should_force_strike);
        assert_eq!(suppressed.alert_level, AlertLevel::Imminent);
        assert!(suppressed.reason.contains("COOLDOWN"));
        assert_eq!(suppressed.intensity, 0.0);

        assert!(bridge.check(&epic, 12_000).should_force_strike);
        assert_eq!(bridge.time_since_last_activation(12_500), Some(500));
    }

    #[test]
    fn test_high_alert_needs_persistence() {
        let mut bridge = DropBridge::default();
        let high = input(2.7, SectionType::Verse, 0.5);
        bridge.check(&high, 0);
        bridge.check(&high, 30);
        assert!(!bridge.is_high_alert());
        bridge.check(&high, 60);
        assert!(bridge.is_high_alert());
        bridge.check(&input(0.5, SectionType::Verse, 0.5), 90);
        assert_eq!(bridge.consecutive_high_z_scores(), 0);
    }

    #[test]
    fn test_z_score_probability() {
        assert!((z_score_to_probability(0.0) - 0.5).abs() < 1e-6);
        assert!((z_score_to_probability(3.0) - 0.00135).abs() < 1e-4);
        assert!(z_score_to_probability(-2.0) > 0.97);
        assert_eq!(describe_z_score(3.2), "EXTREME (0.3%)");
    }
}
