//! Per-frame engine output.

use lumen_core::{ColorDecision, EffectKind, HuntPhase, MusicalPrediction, Zone};
use serde::Serialize;
use std::fmt;

/// Which stage produced the frame's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Physics veto: energy above the hard override threshold
    EnergyOverride,
    /// Statistical divine strike
    DropBridge,
    /// Fuzzy `force_strike`
    Fuzzy,
    /// Hunt strike
    Hunt,
    /// Suggestion of an approved simulation
    Dream,
    /// Forecast-driven modulation
    Prediction,
    /// Aesthetic-driven modulation
    Beauty,
    /// Nothing to do
    #[default]
    Hold,
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecisionSource::EnergyOverride => "energy_override",
            DecisionSource::DropBridge => "drop_bridge",
            DecisionSource::Fuzzy => "fuzzy",
            DecisionSource::Hunt => "hunt",
            DecisionSource::Dream => "dream",
            DecisionSource::Prediction => "prediction",
            DecisionSource::Beauty => "beauty",
            DecisionSource::Hold => "hold",
        };
        f.write_str(name)
    }
}

/// Strobe and flash scaling for the physics layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhysicsModifier {
    pub strobe_intensity: f32,
    pub flash_intensity: f32,
    pub confidence: f32,
}

/// The effect to fire this frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectDecision {
    pub effect: EffectKind,
    pub intensity: f32,
    pub confidence: f32,
    pub reason: String,
}

/// What happened to the proposed effect on its way through the gates.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum GateOutcome {
    /// Nothing was proposed
    #[default]
    NoProposal,
    /// Proposal passed every gate
    Approved,
    /// Cooldown bypassed by an approved simulation, hard minimum honoured
    DnaOverride,
    /// Rejected; the frame is silent
    Blocked(String),
    /// Every member of the divine arsenal was unavailable
    ArsenalExhausted(Vec<EffectKind>),
    /// Another controller holds the fixtures
    DictatorActive,
}

impl GateOutcome {
    /// Did an effect survive?
    pub fn passed(&self) -> bool {
        matches!(self, GateOutcome::Approved | GateOutcome::DnaOverride)
    }
}

/// Diagnostics attached to each output.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DebugInfo {
    pub reasoning: String,
    pub active_prediction: Option<MusicalPrediction>,
    pub zone: Option<Zone>,
    pub hunt_phase: Option<HuntPhase>,
    pub gate: GateOutcome,
    pub worthiness: f32,
    pub z_score: f32,
    pub biases: Vec<String>,
}

/// The engine's decision for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ConsciousnessOutput {
    pub timestamp_ms: u64,
    pub effect_decision: Option<EffectDecision>,
    pub color_decision: Option<ColorDecision>,
    pub physics_modifier: Option<PhysicsModifier>,
    pub confidence: f32,
    pub source: DecisionSource,
    pub debug_info: DebugInfo,
}

impl ConsciousnessOutput {
    /// Silent output for `timestamp_ms`
    pub fn empty(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gate_outcome_wire_format() {
        let blocked = GateOutcome::Blocked("BLOCKED: HARD_COOLDOWN".into());
        assert_eq!(
            serde_json::to_value(&blocked).unwrap(),
            json!({"outcome": "blocked", "detail": "BLOCKED: HARD_COOLDOWN"})
        );
        assert_eq!(
            serde_json::to_value(GateOutcome::DnaOverride).unwrap(),
            json!({"outcome": "dna_override"})
        );
        assert!(GateOutcome::DnaOverride.passed());
        assert!(!blocked.passed());
    }

    #[test]
    fn test_empty_output_is_silent_hold() {
        let output = ConsciousnessOutput::empty(42);
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["timestamp_ms"], 42);
        assert_eq!(value["source"], "hold");
        assert!(value["effect_decision"].is_null());
        assert_eq!(DecisionSource::EnergyOverride.to_string(), "energy_override");
    }
}
