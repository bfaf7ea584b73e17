//! Constitution guard: colour suggestions must respect the active vibe's rules.
//!
//! The engine never generates colours. It only nudges an external colour engine
//! with a [`ColorDecision`], and every such nudge is validated here first.

use crate::sense::beauty::hue_distance;
use crate::types::ColorStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Modifier bounds (±20%)
pub const MOD_MIN: f32 = 0.8;
/// Modifier bounds (±20%)
pub const MOD_MAX: f32 = 1.2;

/// Colour suggestion for the external colour engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorDecision {
    /// Hue to steer towards (degrees)
    pub suggested_hue: Option<f32>,
    /// Harmony strategy
    pub suggested_strategy: Option<ColorStrategy>,
    /// Saturation multiplier
    pub saturation_mod: Option<f32>,
    /// Brightness multiplier
    pub brightness_mod: Option<f32>,
    /// Confidence of the suggestion
    pub confidence: f32,
}

impl ColorDecision {
    /// Whether the decision changes anything at all
    pub fn has_change(&self) -> bool {
        self.suggested_hue.is_some()
            || self.suggested_strategy.is_some()
            || self.saturation_mod.is_some_and(|m| m != 1.0)
            || self.brightness_mod.is_some_and(|m| m != 1.0)
    }
}

/// Colour rules of the active vibe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constitution {
    /// Inclusive hue ranges that must never be suggested; `min > max` wraps
    pub forbidden_hue_ranges: Vec<(f32, f32)>,
    /// Strategy every suggestion is forced to
    pub force_strategy: Option<ColorStrategy>,
}

/// What was wrong with a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Hue inside a forbidden range
    ForbiddenHue,
    /// Saturation modifier outside the bounds
    SaturationOutOfRange,
    /// Brightness modifier outside the bounds
    LightnessOutOfRange,
    /// Strategy other than the forced one
    ForbiddenStrategy,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViolationKind::ForbiddenHue => "forbidden_hue",
            ViolationKind::SaturationOutOfRange => "saturation_out_of_range",
            ViolationKind::LightnessOutOfRange => "lightness_out_of_range",
            ViolationKind::ForbiddenStrategy => "forbidden_strategy",
        })
    }
}

/// One corrected violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Kind
    pub kind: ViolationKind,
    /// Human-readable description with both values
    pub description: String,
}

/// Outcome of a validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// No violations
    pub is_valid: bool,
    /// Violations found
    pub violations: Vec<Violation>,
    /// Corrected decision, present only when something was corrected
    pub corrected: Option<ColorDecision>,
}

impl ValidationResult {
    fn valid() -> Self {
        Self {
            is_valid: true,
            violations: Vec::new(),
            corrected: None,
        }
    }
}

/// Validates and corrects colour decisions.
pub trait ConstitutionGuard: Send + Sync {
    /// Validate `decision` against `constitution`
    fn validate(&self, decision: &ColorDecision, constitution: &Constitution) -> ValidationResult;

    /// The decision to actually emit: the corrected one, or the original if valid
    fn enforce(&self, decision: &ColorDecision, constitution: &Constitution) -> ColorDecision {
        self.validate(decision, constitution)
            .corrected
            .unwrap_or(*decision)
    }
}

/// Built-in guard: nearest allowed hue, clamped modifiers, forced strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConstitutionGuard;

impl ConstitutionGuard for DefaultConstitutionGuard {
    fn validate(&self, decision: &ColorDecision, constitution: &Constitution) -> ValidationResult {
        let mut violations = Vec::new();
        let mut corrected = *decision;

        if let Some(hue) = decision.suggested_hue {
            let ranges = &constitution.forbidden_hue_ranges;
            if let Some(&(min, max)) = ranges
                .iter()
                .find(|(min, max)| hue_in_range(hue, *min, *max))
            {
                let allowed = nearest_allowed_hue(hue, ranges);
                violations.push(Violation {
                    kind: ViolationKind::ForbiddenHue,
                    description: format!(
                        "Hue {:.0} is in forbidden range [{:.0}-{:.0}], corrected to {:.0}",
                        hue, min, max, allowed
                    ),
                });
                corrected.suggested_hue = Some(allowed);
            }
        }

        for (value, slot, kind, label) in [
            (
                decision.saturation_mod,
                &mut corrected.saturation_mod,
                ViolationKind::SaturationOutOfRange,
                "Saturation",
            ),
            (
                decision.brightness_mod,
                &mut corrected.brightness_mod,
                ViolationKind::LightnessOutOfRange,
                "Brightness",
            ),
        ] {
            let Some(value) = value else { continue };
            let clamped = value.clamp(MOD_MIN, MOD_MAX);
            if clamped != value {
                violations.push(Violation {
                    kind,
                    description: format!(
                        "{} modifier {:.2} outside [{}-{}], corrected to {:.2}",
                        label, value, MOD_MIN, MOD_MAX, clamped
                    ),
                });
                *slot = Some(clamped);
            }
        }

        if let (Some(suggested), Some(forced)) =
            (decision.suggested_strategy, constitution.force_strategy)
        {
            if suggested != forced {
                violations.push(Violation {
                    kind: ViolationKind::ForbiddenStrategy,
                    description: format!("Strategy {} not allowed, forced to {}", suggested, forced),
                });
                corrected.suggested_strategy = Some(forced);
            }
        }

        if violations.is_empty() {
            return ValidationResult::valid();
        }
        ValidationResult {
            is_valid: false,
            violations,
            corrected: Some(corrected),
        }
    }
}

fn normalize_hue(hue: f32) -> f32 {
    hue.rem_euclid(360.0)
}

/// Inclusive range test; `min > max` wraps through 0.
pub fn hue_in_range(hue: f32, min: f32, max: f32) -> bool {
    let hue = normalize_hue(hue);
    if min <= max {
        hue >= min && hue <= max
    } else {
        hue >= min || hue <= max
    }
}

fn in_any_range(hue: f32, ranges: &[(f32, f32)]) -> bool {
    ranges.iter().any(|(min, max)| hue_in_range(hue, *min, *max))
}

/// Closest range edge (one degree outside) that is not itself forbidden.
pub fn nearest_allowed_hue(hue: f32, forbidden: &[(f32, f32)]) -> f32 {
    let hue = normalize_hue(hue);
    let mut nearest = hue;
    let mut best = f32::INFINITY;

    for &(min, max) in forbidden {
        for candidate in [normalize_hue(min - 1.0), normalize_hue(max + 1.0)] {
            if in_any_range(candidate, forbidden) {
                continue;
            }
            let distance = hue_distance(hue, candidate);
            if distance < best {
                best = distance;
                nearest = candidate;
            }
        }
    }
    nearest
}
