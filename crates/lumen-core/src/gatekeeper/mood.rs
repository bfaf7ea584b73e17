//! Mood: the operator's appetite for effects, orthogonal to the vibe.
//!
//! A mood scales thresholds, cooldowns and intensities and may block or
//! force-unlock individual effects. It never widens what the vibe allows.

use crate::error::CoreError;
use crate::types::EffectKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Built-in moods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Mood {
    /// Only epic moments fire
    Calm,
    /// Fires when the music really asks for it
    #[default]
    Balanced,
    /// Any excuse is a good one
    Punk,
}

impl Mood {
    /// All moods
    pub const ALL: [Mood; 3] = [Mood::Calm, Mood::Balanced, Mood::Punk];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Calm => "calm",
            Mood::Balanced => "balanced",
            Mood::Punk => "punk",
        }
    }

    /// Built-in profile of this mood
    pub fn profile(&self) -> MoodProfile {
        MoodProfile::for_mood(*self)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| CoreError::UnknownName {
                kind: "mood",
                name: s.to_string(),
            })
    }
}

/// Policy surface the gatekeeper and the orchestrator consult.
pub trait MoodPolicy: Send + Sync {
    /// Which mood this is
    fn mood(&self) -> Mood;

    /// Ethical score a dream must exceed to bypass a regular cooldown
    fn ethics_threshold(&self) -> f32;

    /// Cooldown scale factor
    fn cooldown_multiplier(&self) -> f32;

    /// Scale a base cooldown (rounded to the millisecond)
    fn apply_cooldown(&self, base_ms: u64) -> u64 {
        (base_ms as f32 * self.cooldown_multiplier()).round() as u64
    }

    /// Effective score seen through the mood: `raw / threshold multiplier`
    fn apply_threshold(&self, raw: f32) -> f32;

    /// Clamp an intensity to the mood's range
    fn apply_intensity(&self, intensity: f32) -> f32;

    /// Effect is banned under this mood
    fn is_effect_blocked(&self, effect: EffectKind) -> bool;

    /// Effect skips every availability rule under this mood
    fn is_effect_force_unlocked(&self, effect: EffectKind) -> bool;
}

/// Data-driven mood profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodProfile {
    /// Mood
    pub mood: Mood,
    /// Divides raw scores; above 1 is stricter
    pub threshold_multiplier: f32,
    /// Multiplies cooldowns
    pub cooldown_multiplier: f32,
    /// Dream ethical score needed for a cooldown bypass
    pub ethics_threshold: f32,
    /// Intensity ceiling
    pub max_intensity: f32,
    /// Intensity floor
    pub min_intensity: Option<f32>,
    /// Banned effects
    pub block_list: Vec<EffectKind>,
    /// Effects that ignore cooldowns
    pub force_unlock: Vec<EffectKind>,
}

impl MoodProfile {
    /// Built-in profile of `mood`
    pub fn for_mood(mood: Mood) -> Self {
        match mood {
            Mood::Calm => Self {
                mood,
                threshold_multiplier: 1.3,
                cooldown_multiplier: 2.0,
                ethics_threshold: 0.85,
                max_intensity: 0.6,
                min_intensity: None,
                block_list: vec![EffectKind::StrobeStorm, EffectKind::StrobeBurst],
                force_unlock: Vec::new(),
            },
            Mood::Balanced => Self {
                mood,
                threshold_multiplier: 1.2,
                cooldown_multiplier: 1.2,
                ethics_threshold: 0.90,
                max_intensity: 1.0,
                min_intensity: None,
                block_list: Vec::new(),
                force_unlock: Vec::new(),
            },
            Mood::Punk => Self {
                mood,
                threshold_multiplier: 0.8,
                cooldown_multiplier: 0.7,
                ethics_threshold: 0.75,
                max_intensity: 1.0,
                min_intensity: Some(0.5),
                block_list: Vec::new(),
                force_unlock: vec![EffectKind::StrobeBurst, EffectKind::SolarFlare],
            },
        }
    }
}

impl Default for MoodProfile {
    fn default() -> Self {
        Self::for_mood(Mood::default())
    }
}

impl MoodPolicy for MoodProfile {
    fn mood(&self) -> Mood {
        self.mood
    }

    fn ethics_threshold(&self) -> f32 {
        self.ethics_threshold
    }

    fn cooldown_multiplier(&self) -> f32 {
        self.cooldown_multiplier
    }

    fn apply_threshold(&self, raw: f32) -> f32 {
        raw / self.threshold_multiplier
    }

    fn apply_intensity(&self, intensity: f32) -> f32 {
        let capped = intensity.min(self.max_intensity);
        match self.min_intensity {
            Some(floor) => capped.max(floor),
            None => capped,
        }
    }

    fn is_effect_blocked(&self, effect: EffectKind) -> bool {
        self.block_list.contains(&effect)
    }

    fn is_effect_force_unlocked(&self, effect: EffectKind) -> bool {
        self.force_unlock.contains(&effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_names() {
        assert_eq!("punk".parse::<Mood>().unwrap(), Mood::Punk);
        assert!("angry".parse::<Mood>().is_err());
        assert_eq!(Mood::default(), Mood::Balanced);
    }

    #[test]
    fn test_cooldown_scaling() {
        assert_eq!(Mood::Calm.profile().apply_cooldown(25000), 50000);
        assert_eq!(Mood::Punk.profile().apply_cooldown(25000), 17500);
        assert_eq!(Mood::Balanced.profile().apply_cooldown(10000), 12000);
    }

    #[test]
    fn test_threshold_scaling() {
        let calm = Mood::Calm.profile();
        assert!((calm.apply_threshold(0.65) - 0.5).abs() < 1e-6);
        let punk = Mood::Punk.profile();
        assert!(punk.apply_threshold(0.6) > 0.7);
    }

    #[test]
    fn test_intensity_range() {
        assert_eq!(Mood::Calm.profile().apply_intensity(0.9), 0.6);
        assert_eq!(Mood::Punk.profile().apply_intensity(0.3), 0.5);
        assert_eq!(Mood::Balanced.profile().apply_intensity(0.3), 0.3);
    }

    #[test]
    fn test_block_and_unlock_lists() {
        let calm = Mood::Calm.profile();
        assert!(calm.is_effect_blocked(EffectKind::StrobeStorm));
        assert!(!calm.is_effect_force_unlocked(EffectKind::SolarFlare));
        let punk = Mood::Punk.profile();
        assert!(punk.is_effect_force_unlocked(EffectKind::SolarFlare));
        assert!(!punk.is_effect_blocked(EffectKind::StrobeStorm));
    }
}
