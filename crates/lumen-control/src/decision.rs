//! Decision synthesis.
//!
//! A [`DecisionMaker`] turns the signals gathered in a frame into one raw
//! proposal. The proposal is not final: the engine still runs it through the
//! gatekeeper, which may silence it.

use crate::dream::DreamOutcome;
use crate::output::{DecisionSource, EffectDecision, PhysicsModifier};
use lumen_core::gatekeeper::divine_arsenal;
use lumen_core::hunt::StrikeConditions;
use lumen_core::{
    BeautyAnalysis, ColorDecision, ColorStrategy, ConsonanceAnalysis, DropBridgeResult,
    EffectGatekeeper, EffectKind, EnergyContext, FuzzyAction, FuzzyDecision, HuntDecision,
    HuntPhase, MoodPolicy, MusicalPattern, MusicalPrediction, PredictionKind, SectionType,
    SpectralContext, Trend, Vibe,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Signals available to a decision maker.
pub struct DecisionInputs<'a> {
    pub pattern: &'a MusicalPattern,
    pub beauty: &'a BeautyAnalysis,
    pub consonance: &'a ConsonanceAnalysis,
    pub hunt: &'a HuntDecision,
    pub prediction: Option<&'a MusicalPrediction>,
    pub fuzzy: &'a FuzzyDecision,
    pub drop_bridge: &'a DropBridgeResult,
    pub energy: &'a EnergyContext,
    pub z_score: f32,
    pub spectral: &'a SpectralContext,
    pub dream: Option<&'a DreamOutcome>,
    pub dictator_active: bool,
    pub gatekeeper: &'a EffectGatekeeper,
    pub mood: &'a dyn MoodPolicy,
}

/// Ordered candidates for a divine strike; the gatekeeper fires the first
/// available one.
#[derive(Debug, Clone, PartialEq)]
pub struct DivineStrike {
    pub arsenal: Vec<EffectKind>,
    pub intensity: f32,
    pub reason: String,
}

/// Unvalidated proposal for one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawDecision {
    pub effect: Option<EffectDecision>,
    pub divine: Option<DivineStrike>,
    pub color: Option<ColorDecision>,
    pub physics: Option<PhysicsModifier>,
    pub confidence: f32,
    pub source: DecisionSource,
    pub reasoning: String,
}

impl RawDecision {
    fn hold(confidence: f32, reasoning: impl Into<String>) -> Self {
        Self {
            confidence,
            reasoning: reasoning.into(),
            ..Default::default()
        }
    }
}

/// Pluggable synthesis point.
pub trait DecisionMaker: Send + Sync {
    fn decide(&self, inputs: &DecisionInputs<'_>) -> RawDecision;
}

/// Tunables of [`HuntDecisionMaker`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionMakerConfig {
    pub min_confidence: f32,
    pub hunt_weight: f32,
    pub prediction_weight: f32,
    pub beauty_weight: f32,
    pub worthiness_threshold: f32,
    /// Raw energy below which no effect is proposed
    pub energy_veto: f32,
    /// Share of a fuzzy strike/prepare hint blended into colour and physics
    pub fuzzy_weight: f32,
}

impl Default for DecisionMakerConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.55,
            hunt_weight: 0.4,
            prediction_weight: 0.3,
            beauty_weight: 0.3,
            worthiness_threshold: 0.65,
            energy_veto: 0.20,
            fuzzy_weight: 0.3,
        }
    }
}

/// Default arbitration: statistical and fuzzy overrides first, then the hunt,
/// then colour and physics modulation.
#[derive(Debug, Clone, Default)]
pub struct HuntDecisionMaker {
    config: DecisionMakerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecisionKind {
    Strike,
    PrepareForDrop,
    BuildupEnhance,
    SubtleShift,
    Hold,
}

impl HuntDecisionMaker {
    pub fn new(config: DecisionMakerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecisionMakerConfig {
        &self.config
    }

    fn combined_confidence(&self, inputs: &DecisionInputs<'_>) -> f32 {
        let prediction = inputs.prediction.map_or(0.0, |p| p.probability);
        let mut combined = inputs.hunt.confidence * self.config.hunt_weight
            + prediction * self.config.prediction_weight
            + inputs.beauty.total_beauty * self.config.beauty_weight;

        // Agreement bonus
        if inputs.hunt.worthiness > self.config.worthiness_threshold
            && inputs.prediction.is_some()
            && inputs.beauty.trend == Trend::Rising
        {
            combined = (combined + 0.1).min(1.0);
        }
        // Contradiction penalty
        if inputs.hunt.phase == HuntPhase::Sleeping && prediction > 0.8 {
            combined *= 0.85;
        }
        combined
    }

    fn classify(&self, inputs: &DecisionInputs<'_>) -> DecisionKind {
        let worthiness = inputs.mood.apply_threshold(inputs.hunt.worthiness);
        if worthiness >= self.config.worthiness_threshold && inputs.hunt.confidence > 0.5 {
            return DecisionKind::Strike;
        }

        if let Some(prediction) = inputs.prediction {
            if prediction.kind == PredictionKind::DropIncoming && prediction.probability > 0.8 {
                return DecisionKind::PrepareForDrop;
            }
        }

        let buildup_predicted = inputs.prediction.is_some_and(|p| {
            p.kind == PredictionKind::BuildupStarting && p.probability > 0.7
        });
        if inputs.pattern.section == SectionType::Buildup || buildup_predicted {
            return DecisionKind::BuildupEnhance;
        }

        if inputs.beauty.total_beauty > 0.75 && inputs.beauty.trend == Trend::Rising {
            return DecisionKind::SubtleShift;
        }

        DecisionKind::Hold
    }

    fn divine(
        &self,
        inputs: &DecisionInputs<'_>,
        intensity: f32,
        source: DecisionSource,
        reason: String,
    ) -> RawDecision {
        let vibe = inputs.pattern.vibe;
        RawDecision {
            effect: None,
            divine: Some(DivineStrike {
                arsenal: divine_arsenal(vibe).to_vec(),
                intensity,
                reason: reason.clone(),
            }),
            color: Some(ColorDecision {
                suggested_strategy: Some(ColorStrategy::Complementary),
                saturation_mod: Some(1.15),
                brightness_mod: Some(1.1),
                confidence: 0.95,
                ..Default::default()
            }),
            physics: Some(PhysicsModifier {
                strobe_intensity: 1.0,
                flash_intensity: 1.0,
                confidence: 0.95,
            }),
            confidence: 0.95,
            source,
            reasoning: reason,
        }
    }

    fn strike(&self, inputs: &DecisionInputs<'_>, confidence: f32) -> RawDecision {
        let pattern = inputs.pattern;
        let beauty = inputs.beauty.total_beauty;

        let mut decision = RawDecision {
            color: Some(ColorDecision {
                suggested_strategy: Some(if pattern.emotional_tension > 0.6 {
                    ColorStrategy::Complementary
                } else {
                    ColorStrategy::Triadic
                }),
                saturation_mod: Some(1.0 + beauty * 0.15),
                brightness_mod: Some(1.0 + pattern.rhythmic_intensity * 0.10),
                confidence,
                ..Default::default()
            }),
            physics: Some(PhysicsModifier {
                strobe_intensity: 0.7 + pattern.rhythmic_intensity * 0.3,
                flash_intensity: 0.8 + beauty * 0.2,
                confidence,
            }),
            confidence,
            source: DecisionSource::Hunt,
            reasoning: format!("STRIKE: {}", inputs.hunt.reasoning),
            ..Default::default()
        };

        if pattern.raw_energy < self.config.energy_veto {
            decision.reasoning = format!(
                "ENERGY VETO: raw energy {:.2} < {:.2}",
                pattern.raw_energy, self.config.energy_veto
            );
            debug!("{}", decision.reasoning);
            return decision;
        }
        if confidence <= 0.5 {
            return decision;
        }

        let urgency = inputs.hunt.conditions.map_or(0.0, |c| c.urgency);
        let strike_intensity = urgency.max(pattern.emotional_tension).max(0.7);

        if let Some(verdict) = inputs.dream.and_then(|d| d.approved()) {
            if let Some(effect) = verdict.suggested_effect {
                decision.source = DecisionSource::Dream;
                decision.effect = Some(EffectDecision {
                    effect,
                    intensity: normalized(strike_intensity),
                    confidence,
                    reason: format!(
                        "DREAM STRIKE [{}]: {} (ethics {:.2})",
                        pattern.vibe, effect, verdict.ethical_score
                    ),
                });
                return decision;
            }
        }

        let selection = select_effect_by_vibe(
            pattern.vibe,
            strike_intensity,
            inputs.hunt.conditions.as_ref(),
            inputs.beauty,
        )
        .or_else(|| zone_pick(inputs, strike_intensity));

        match selection {
            Some(selection) => {
                debug!(
                    "INTENT: {} [{}] intensity={:.2} worthiness={:.2}",
                    selection.effect, pattern.vibe, selection.intensity, inputs.hunt.worthiness
                );
                decision.effect = Some(EffectDecision {
                    effect: selection.effect,
                    intensity: selection.intensity,
                    confidence,
                    reason: format!(
                        "HUNT STRIKE [{}]: {} ({}) urgency={:.2} worthiness={:.2} raw={:.2}",
                        pattern.vibe,
                        selection.effect,
                        selection.reasoning,
                        urgency,
                        inputs.hunt.worthiness,
                        pattern.raw_energy
                    ),
                });
            }
            None => {
                trace!("No strong decision for {}", pattern.vibe);
                decision.reasoning =
                    format!("STRIKE without effect: nothing fits {}", pattern.vibe);
            }
        }
        decision
    }

    /// Blend a fuzzy strike or prepare vote into a modulation-only decision.
    fn blend_fuzzy(&self, primary: RawDecision, fuzzy: &FuzzyDecision) -> RawDecision {
        if primary.effect.is_some() || primary.divine.is_some() {
            return primary;
        }
        if !matches!(fuzzy.action, FuzzyAction::Strike | FuzzyAction::Prepare) {
            return primary;
        }
        let hint = RawDecision {
            color: Some(ColorDecision {
                saturation_mod: Some(1.0 + fuzzy.intensity * 0.1),
                brightness_mod: Some(1.0 + fuzzy.intensity * 0.05),
                confidence: fuzzy.confidence,
                ..Default::default()
            }),
            physics: Some(PhysicsModifier {
                strobe_intensity: fuzzy.intensity,
                flash_intensity: fuzzy.intensity * 0.8,
                confidence: fuzzy.confidence,
            }),
            confidence: fuzzy.confidence,
            source: DecisionSource::Fuzzy,
            reasoning: fuzzy.reasoning.clone(),
            ..Default::default()
        };
        let mut merged = merge_decisions(&primary, &hint, 1.0 - self.config.fuzzy_weight);
        merged.reasoning = format!("{} + fuzzy {}", primary.reasoning, fuzzy.action);
        merged
    }

    /// Modulations too small to see are dropped to a plain hold.
    fn settle(decision: RawDecision) -> RawDecision {
        if decision.effect.is_some() || decision.divine.is_some() {
            return decision;
        }
        if decision.color.is_none() && decision.physics.is_none() {
            return decision;
        }
        if is_significant_decision(&decision) {
            return decision;
        }
        trace!("Insignificant modulation dropped: {}", decision.reasoning);
        RawDecision::hold(decision.confidence, decision.reasoning)
    }

    fn prepare_for_drop(&self, inputs: &DecisionInputs<'_>, confidence: f32) -> RawDecision {
        let probability = inputs.prediction.map_or(0.0, |p| p.probability);
        RawDecision {
            color: Some(ColorDecision {
                saturation_mod: Some(1.05),
                brightness_mod: Some(0.95),
                confidence: probability,
                ..Default::default()
            }),
            physics: Some(PhysicsModifier {
                strobe_intensity: 0.3 + inputs.pattern.emotional_tension * 0.3,
                flash_intensity: 0.2,
                confidence: probability,
            }),
            confidence,
            source: DecisionSource::Prediction,
            reasoning: format!(
                "Preparing drop: {}",
                inputs.prediction.map_or("", |p| p.reasoning.as_str())
            ),
            ..Default::default()
        }
    }

    fn buildup_enhance(&self, inputs: &DecisionInputs<'_>, confidence: f32) -> RawDecision {
        let tension = inputs.pattern.emotional_tension;
        let factor = tension * 0.1;
        RawDecision {
            color: Some(ColorDecision {
                saturation_mod: Some(1.0 + factor),
                brightness_mod: Some(1.0 + factor * 0.5),
                confidence: confidence * 0.8,
                ..Default::default()
            }),
            physics: Some(PhysicsModifier {
                strobe_intensity: 0.2 + tension * 0.4,
                flash_intensity: 0.3 + inputs.pattern.rhythmic_intensity * 0.3,
                confidence: confidence * 0.7,
            }),
            confidence,
            source: DecisionSource::Prediction,
            reasoning: format!("Buildup enhance (tension {:.2})", tension),
            ..Default::default()
        }
    }

    fn subtle_shift(&self, inputs: &DecisionInputs<'_>, confidence: f32) -> RawDecision {
        let beauty = inputs.beauty.total_beauty;
        RawDecision {
            color: Some(ColorDecision {
                saturation_mod: Some(1.0 + (beauty - 0.5) * 0.05),
                brightness_mod: Some(1.0),
                confidence: confidence * 0.6,
                ..Default::default()
            }),
            physics: Some(PhysicsModifier {
                strobe_intensity: inputs.pattern.rhythmic_intensity * 0.3,
                flash_intensity: 0.2,
                confidence: confidence * 0.5,
            }),
            confidence: confidence * 0.7,
            source: DecisionSource::Beauty,
            reasoning: format!("High beauty ({:.2}), subtle shift", beauty),
            ..Default::default()
        }
    }
}

impl DecisionMaker for HuntDecisionMaker {
    fn decide(&self, inputs: &DecisionInputs<'_>) -> RawDecision {
        if inputs.drop_bridge.should_force_strike {
            return self.divine(
                inputs,
                inputs.drop_bridge.intensity,
                DecisionSource::DropBridge,
                format!("DIVINE STRIKE: {}", inputs.drop_bridge.reason),
            );
        }
        if inputs.fuzzy.action == FuzzyAction::ForceStrike {
            return self.divine(
                inputs,
                inputs.fuzzy.intensity,
                DecisionSource::Fuzzy,
                format!("FUZZY FORCE STRIKE: {}", inputs.fuzzy.reasoning),
            );
        }

        let confidence = self.combined_confidence(inputs);
        if confidence < self.config.min_confidence {
            return RawDecision::hold(
                confidence,
                format!(
                    "Insufficient confidence: {:.2} < {:.2}",
                    confidence, self.config.min_confidence
                ),
            );
        }

        let primary = match self.classify(inputs) {
            DecisionKind::Strike => self.strike(inputs, confidence),
            DecisionKind::PrepareForDrop => self.prepare_for_drop(inputs, confidence),
            DecisionKind::BuildupEnhance => self.buildup_enhance(inputs, confidence),
            DecisionKind::SubtleShift => self.subtle_shift(inputs, confidence),
            DecisionKind::Hold => RawDecision::hold(confidence * 0.5, "Hold: nothing to do"),
        };
        Self::settle(self.blend_fuzzy(primary, inputs.fuzzy))
    }
}

/// Effect picked for a strike.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectSelection {
    pub effect: EffectKind,
    pub intensity: f32,
    pub reasoning: String,
}

fn normalized(strike_intensity: f32) -> f32 {
    (0.8 + strike_intensity * 0.2).min(1.0)
}

/// Signature effect of `vibe` for a strike, or `None` when the vibe has no
/// signature weapons.
pub fn select_effect_by_vibe(
    vibe: Vibe,
    strike_intensity: f32,
    conditions: Option<&StrikeConditions>,
    beauty: &BeautyAnalysis,
) -> Option<EffectSelection> {
    let intensity = normalized(strike_intensity);
    let urgency = conditions.map_or(0.5, |c| c.urgency);
    let strike_score = conditions.map_or(0.0, |c| c.strike_score);
    let beauty_score = beauty.total_beauty;
    let trend = beauty.trend;

    let pick = |effect, intensity: f32, reasoning: String| {
        Some(EffectSelection {
            effect,
            intensity: intensity.min(1.0),
            reasoning,
        })
    };

    match vibe {
        Vibe::TechnoClub => {
            if urgency > 0.7 || strike_intensity > 0.8 {
                pick(
                    EffectKind::IndustrialStrobe,
                    intensity,
                    format!("hammer: urgency={:.2}", urgency),
                )
            } else if beauty_score > 0.4 || trend == Trend::Rising {
                pick(
                    EffectKind::AcidSweep,
                    0.7 + beauty_score * 0.3,
                    format!("blade: beauty={:.2}", beauty_score),
                )
            } else if strike_score > 0.7 || trend == Trend::Stable {
                pick(
                    EffectKind::CyberDualism,
                    intensity * 0.9,
                    format!("shift: score={:.2}", strike_score),
                )
            } else {
                pick(EffectKind::AcidSweep, intensity * 0.75, "ambient fallback".into())
            }
        }
        Vibe::FiestaLatina => {
            if urgency > 0.6 || strike_intensity > 0.75 {
                pick(
                    EffectKind::SolarFlare,
                    intensity,
                    format!("flare: urgency={:.2}", urgency),
                )
            } else if beauty_score > 0.3 {
                pick(
                    EffectKind::StrobeBurst,
                    0.75 + beauty_score * 0.25,
                    format!("burst: beauty={:.2}", beauty_score),
                )
            } else {
                pick(EffectKind::SolarFlare, intensity * 0.9, "golden signature".into())
            }
        }
        Vibe::PopRock => pick(EffectKind::SolarFlare, intensity * 0.8, "pop signature".into()),
        Vibe::ChillLounge | Vibe::Idle => None,
    }
}

/// First effect allowed in the current zone that is available right now.
fn zone_pick(inputs: &DecisionInputs<'_>, strike_intensity: f32) -> Option<EffectSelection> {
    let vibe = inputs.pattern.vibe;
    let zone = inputs.energy.zone;
    let now = inputs.pattern.timestamp_ms;
    inputs
        .gatekeeper
        .effects_allowed_for_zone(zone, vibe)
        .into_iter()
        .find(|&effect| {
            inputs
                .gatekeeper
                .check_availability(effect, vibe, inputs.mood, now)
                .available
        })
        .map(|effect| EffectSelection {
            effect,
            intensity: normalized(strike_intensity) * 0.8,
            reasoning: format!("zone pick in {}", zone),
        })
}

/// Weighted blend of two decisions; colour and physics fall back to whichever
/// side has them.
pub fn merge_decisions(
    primary: &RawDecision,
    secondary: &RawDecision,
    primary_weight: f32,
) -> RawDecision {
    let pw = primary_weight.clamp(0.0, 1.0);
    let sw = 1.0 - pw;
    let confidence = primary.confidence * pw + secondary.confidence * sw;

    let blend = |p: Option<f32>, s: Option<f32>| Some(p.unwrap_or(1.0) * pw + s.unwrap_or(1.0) * sw);
    let color = match (primary.color, secondary.color) {
        (Some(p), Some(s)) => Some(ColorDecision {
            saturation_mod: blend(p.saturation_mod, s.saturation_mod),
            brightness_mod: blend(p.brightness_mod, s.brightness_mod),
            confidence,
            ..p
        }),
        (p, s) => p.or(s),
    };
    let physics = match (primary.physics, secondary.physics) {
        (Some(p), Some(s)) => Some(PhysicsModifier {
            strobe_intensity: p.strobe_intensity * pw + s.strobe_intensity * sw,
            flash_intensity: p.flash_intensity * pw + s.flash_intensity * sw,
            confidence,
        }),
        (p, s) => p.or(s),
    };

    RawDecision {
        effect: primary.effect.clone(),
        divine: primary.divine.clone(),
        color,
        physics,
        confidence,
        source: primary.source,
        reasoning: format!("Merged: {}", primary.reasoning),
    }
}

/// Worth applying: confident, and either a visible colour change or strong
/// physics.
pub fn is_significant_decision(decision: &RawDecision) -> bool {
    if decision.confidence < 0.5 {
        return false;
    }
    if let Some(color) = decision.color {
        let sat = (color.saturation_mod.unwrap_or(1.0) - 1.0).abs();
        let bright = (color.brightness_mod.unwrap_or(1.0) - 1.0).abs();
        if sat > 0.02 || bright > 0.02 {
            return true;
        }
    }
    decision
        .physics
        .is_some_and(|p| p.strobe_intensity > 0.5 || p.flash_intensity > 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::FuzzyScores;

    fn beauty(total: f32, trend: Trend) -> BeautyAnalysis {
        BeautyAnalysis {
            total_beauty: total,
            trend,
            ..BeautyAnalysis::neutral(0)
        }
    }

    fn fuzzy_vote(action: FuzzyAction, intensity: f32, confidence: f32) -> FuzzyDecision {
        FuzzyDecision {
            action,
            intensity,
            confidence,
            scores: FuzzyScores::default(),
            dominant_rule: "test_rule",
            activations: Vec::new(),
            reasoning: format!("{} vote", action),
        }
    }

    fn buildup(confidence: f32) -> RawDecision {
        RawDecision {
            color: Some(ColorDecision {
                saturation_mod: Some(1.06),
                brightness_mod: Some(1.03),
                confidence,
                ..Default::default()
            }),
            physics: Some(PhysicsModifier {
                strobe_intensity: 0.4,
                flash_intensity: 0.4,
                confidence,
            }),
            confidence,
            source: DecisionSource::Prediction,
            reasoning: "Buildup enhance".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_fuzzy_strike_vote_blends_into_modulation() {
        let maker = HuntDecisionMaker::default();
        let blended = maker.blend_fuzzy(buildup(0.7), &fuzzy_vote(FuzzyAction::Strike, 1.0, 0.9));

        assert_eq!(blended.source, DecisionSource::Prediction);
        let physics = blended.physics.unwrap();
        // 0.7 * 0.4 + 0.3 * 1.0
        assert!((physics.strobe_intensity - 0.58).abs() < 1e-5);
        assert!((blended.confidence - 0.76).abs() < 1e-5);
        assert!(blended.reasoning.contains("fuzzy strike"));
    }

    #[test]
    fn test_fuzzy_hold_vote_leaves_decision_alone() {
        let maker = HuntDecisionMaker::default();
        let primary = buildup(0.7);
        let blended = maker.blend_fuzzy(primary.clone(), &fuzzy_vote(FuzzyAction::Hold, 0.0, 0.9));
        assert_eq!(blended, primary);
    }

    #[test]
    fn test_fuzzy_vote_never_touches_a_strike() {
        let maker = HuntDecisionMaker::default();
        let strike = RawDecision {
            effect: Some(EffectDecision {
                effect: EffectKind::IndustrialStrobe,
                intensity: 0.9,
                confidence: 0.8,
                reason: "hunt".into(),
            }),
            confidence: 0.8,
            source: DecisionSource::Hunt,
            ..Default::default()
        };
        let blended = maker.blend_fuzzy(strike.clone(), &fuzzy_vote(FuzzyAction::Prepare, 0.5, 0.9));
        assert_eq!(blended, strike);
    }

    #[test]
    fn test_faint_modulation_settles_to_hold() {
        let faint = RawDecision {
            color: Some(ColorDecision {
                saturation_mod: Some(1.01),
                brightness_mod: Some(1.0),
                confidence: 0.4,
                ..Default::default()
            }),
            physics: Some(PhysicsModifier {
                strobe_intensity: 0.1,
                flash_intensity: 0.2,
                confidence: 0.4,
            }),
            confidence: 0.6,
            source: DecisionSource::Beauty,
            reasoning: "High beauty".into(),
            ..Default::default()
        };
        let settled = HuntDecisionMaker::settle(faint);
        assert_eq!(settled.source, DecisionSource::Hold);
        assert!(settled.color.is_none());
        assert!(settled.physics.is_none());
        assert_eq!(settled.reasoning, "High beauty");

        let visible = buildup(0.7);
        assert_eq!(HuntDecisionMaker::settle(visible.clone()), visible);
    }

    #[test]
    fn test_techno_hammer_on_urgency() {
        let selection =
            select_effect_by_vibe(Vibe::TechnoClub, 0.9, None, &beauty(0.5, Trend::Stable)).unwrap();
        assert_eq!(selection.effect, EffectKind::IndustrialStrobe);
        assert!((selection.intensity - 0.98).abs() < 1e-5);
    }

    #[test]
    fn test_techno_blade_on_beauty() {
        let selection =
            select_effect_by_vibe(Vibe::TechnoClub, 0.7, None, &beauty(0.6, Trend::Falling)).unwrap();
        assert_eq!(selection.effect, EffectKind::AcidSweep);
    }

    #[test]
    fn test_latina_burst_and_flare() {
        let flare =
            select_effect_by_vibe(Vibe::FiestaLatina, 0.8, None, &beauty(0.5, Trend::Stable)).unwrap();
        assert_eq!(flare.effect, EffectKind::SolarFlare);
        let burst =
            select_effect_by_vibe(Vibe::FiestaLatina, 0.7, None, &beauty(0.5, Trend::Stable)).unwrap();
        assert_eq!(burst.effect, EffectKind::StrobeBurst);
    }

    #[test]
    fn test_chill_has_no_signature() {
        let lush = beauty(0.9, Trend::Rising);
        assert!(select_effect_by_vibe(Vibe::ChillLounge, 1.0, None, &lush).is_none());
        assert!(select_effect_by_vibe(Vibe::Idle, 1.0, None, &lush).is_none());
    }

    #[test]
    fn test_merge_weights() {
        let primary = RawDecision {
            color: Some(ColorDecision {
                saturation_mod: Some(1.2),
                ..Default::default()
            }),
            physics: Some(PhysicsModifier {
                strobe_intensity: 1.0,
                flash_intensity: 0.0,
                confidence: 1.0,
            }),
            confidence: 1.0,
            source: DecisionSource::Hunt,
            ..Default::default()
        };
        let secondary = RawDecision {
            color: Some(ColorDecision {
                saturation_mod: Some(1.0),
                ..Default::default()
            }),
            physics: Some(PhysicsModifier {
                strobe_intensity: 0.0,
                flash_intensity: 1.0,
                confidence: 0.0,
            }),
            confidence: 0.0,
            ..Default::default()
        };
        let merged = merge_decisions(&primary, &secondary, 0.75);
        assert!((merged.confidence - 0.75).abs() < 1e-6);
        assert!((merged.color.unwrap().saturation_mod.unwrap() - 1.15).abs() < 1e-6);
        let physics = merged.physics.unwrap();
        assert!((physics.strobe_intensity - 0.75).abs() < 1e-6);
        assert!((physics.flash_intensity - 0.25).abs() < 1e-6);
        assert_eq!(merged.source, DecisionSource::Hunt);
    }

    #[test]
    fn test_significance() {
        let mut decision = RawDecision {
            confidence: 0.8,
            color: Some(ColorDecision {
                saturation_mod: Some(1.01),
                brightness_mod: Some(1.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(!is_significant_decision(&decision));
        decision.physics = Some(PhysicsModifier {
            strobe_intensity: 0.6,
            flash_intensity: 0.0,
            confidence: 0.8,
        });
        assert!(is_significant_decision(&decision));
        decision.confidence = 0.4;
        assert!(!is_significant_decision(&decision));
    }
}
