use async_trait::async_trait;
use lumen_control::{
    ConsciousEngine, ControlError, DecisionInputs, DecisionMaker, DecisionSource, DictatorLock,
    DivineStrike, DreamRequest, DreamSimulator, DreamVerdict, EffectDecision, EffectFiredEvent,
    GateOutcome, RawDecision, ScenarioDreamSimulator, UsageLog,
};
use lumen_core::constitution::{Violation, ViolationKind};
use lumen_core::gatekeeper::divine_arsenal;
use lumen_core::{
    AudioFrame, BiasType, ColorDecision, Constitution, ConstitutionGuard, EffectKind,
    EngineConfig, HuntPhase, ValidationResult, Vibe,
};
use std::sync::Arc;
use std::time::Duration;

/// Proposes the same effect every frame.
struct Propose(EffectKind);

impl DecisionMaker for Propose {
    fn decide(&self, _inputs: &DecisionInputs<'_>) -> RawDecision {
        RawDecision {
            effect: Some(EffectDecision {
                effect: self.0,
                intensity: 0.9,
                confidence: 0.8,
                reason: "always".into(),
            }),
            confidence: 0.8,
            source: DecisionSource::Hunt,
            reasoning: "always".into(),
            ..Default::default()
        }
    }
}

/// Calls a divine strike every frame.
struct AlwaysDivine;

impl DecisionMaker for AlwaysDivine {
    fn decide(&self, inputs: &DecisionInputs<'_>) -> RawDecision {
        RawDecision {
            divine: Some(DivineStrike {
                arsenal: divine_arsenal(inputs.pattern.vibe).to_vec(),
                intensity: 1.0,
                reason: "divine".into(),
            }),
            confidence: 0.95,
            source: DecisionSource::DropBridge,
            reasoning: "divine".into(),
            ..Default::default()
        }
    }
}

/// Calls a divine strike with a fixed arsenal.
struct Divine(Vec<EffectKind>);

impl DecisionMaker for Divine {
    fn decide(&self, _inputs: &DecisionInputs<'_>) -> RawDecision {
        RawDecision {
            divine: Some(DivineStrike {
                arsenal: self.0.clone(),
                intensity: 1.0,
                reason: "fixed arsenal".into(),
            }),
            confidence: 0.95,
            source: DecisionSource::DropBridge,
            reasoning: "fixed arsenal".into(),
            ..Default::default()
        }
    }
}

/// Paints the same hue every frame.
struct PaintHue(f32);

impl DecisionMaker for PaintHue {
    fn decide(&self, _inputs: &DecisionInputs<'_>) -> RawDecision {
        RawDecision {
            color: Some(ColorDecision {
                suggested_hue: Some(self.0),
                saturation_mod: Some(1.1),
                confidence: 0.9,
                ..Default::default()
            }),
            confidence: 0.9,
            source: DecisionSource::Beauty,
            reasoning: "paint".into(),
            ..Default::default()
        }
    }
}

/// Forbids every hue suggestion.
struct NoHues;

impl ConstitutionGuard for NoHues {
    fn validate(&self, decision: &ColorDecision, _constitution: &Constitution) -> ValidationResult {
        if decision.suggested_hue.is_none() {
            return ValidationResult {
                is_valid: true,
                violations: Vec::new(),
                corrected: None,
            };
        }
        ValidationResult {
            is_valid: false,
            violations: vec![Violation {
                kind: ViolationKind::ForbiddenHue,
                description: "no hues".into(),
            }],
            corrected: Some(ColorDecision {
                suggested_hue: None,
                ..*decision
            }),
        }
    }
}

struct Slow;

#[async_trait]
impl DreamSimulator for Slow {
    async fn simulate(&self, _request: DreamRequest) -> lumen_control::Result<DreamVerdict> {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Err(ControlError::Simulation("unreachable".into()))
    }
}

struct Broken;

#[async_trait]
impl DreamSimulator for Broken {
    async fn simulate(&self, _request: DreamRequest) -> lumen_control::Result<DreamVerdict> {
        Err(ControlError::Simulation("model offline".into()))
    }
}

/// Approves everything with a fixed ethical score.
struct Approve(f32);

#[async_trait]
impl DreamSimulator for Approve {
    async fn simulate(&self, _request: DreamRequest) -> lumen_control::Result<DreamVerdict> {
        Ok(DreamVerdict {
            approved: true,
            suggested_effect: None,
            ethical_score: self.0,
            reasoning: "fine".into(),
        })
    }
}

fn frame(vibe: Vibe, energy: f32, timestamp_ms: u64) -> AudioFrame {
    AudioFrame {
        energy,
        raw_energy: energy,
        smoothed_energy: energy,
        bass: energy,
        vibe: Some(vibe),
        timestamp_ms,
        ..Default::default()
    }
}

fn always_dream() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.engine.dream_worthiness_threshold = 0.0;
    config
}

#[tokio::test]
async fn test_energy_override_short_circuits() {
    let mut engine = ConsciousEngine::new(EngineConfig::default()).unwrap();
    let output = engine.process(&frame(Vibe::TechnoClub, 0.95, 0)).await;

    assert_eq!(output.source, DecisionSource::EnergyOverride);
    assert!(output.effect_decision.is_none());
    assert_eq!(output.physics_modifier.unwrap().strobe_intensity, 1.0);
    assert_eq!(engine.stats().energy_overrides, 1);
    // Nothing downstream ran
    assert_eq!(engine.hunt_state().frames_in_phase, 0);
    assert!(engine.state().energy_trend.is_empty());
    assert!(engine.state().last_pattern.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dream_timeout_does_not_block_frame() {
    let mut engine = ConsciousEngine::new(always_dream())
        .unwrap()
        .with_dream_simulator(Arc::new(Slow));
    let output = engine.process(&frame(Vibe::PopRock, 0.5, 33)).await;

    assert_eq!(output.timestamp_ms, 33);
    assert_eq!(engine.stats().dreams_simulated, 1);
    assert_eq!(engine.stats().dream_timeouts, 1);
    assert_eq!(engine.stats().frames_processed, 1);
}

#[tokio::test]
async fn test_dream_failure_is_not_fatal() {
    let mut engine = ConsciousEngine::new(always_dream())
        .unwrap()
        .with_dream_simulator(Arc::new(Broken));
    for i in 0..3u64 {
        engine.process(&frame(Vibe::TechnoClub, 0.5, i * 33)).await;
    }
    assert_eq!(engine.stats().dreams_simulated, 3);
    assert_eq!(engine.stats().dream_timeouts, 0);
    assert_eq!(engine.stats().frames_processed, 3);
}

#[tokio::test]
async fn test_cooldown_registered_only_on_confirmation() {
    let usage = Arc::new(UsageLog::new());
    let mut engine = ConsciousEngine::new(EngineConfig::default())
        .unwrap()
        .with_decision_maker(Propose(EffectKind::AcidSweep))
        .with_usage_recorder(usage.clone());
    let confirmations = engine.confirmation_sender();

    // Proposals alone never start a cooldown
    for t in [0u64, 100] {
        let output = engine.process(&frame(Vibe::TechnoClub, 0.5, t)).await;
        let decision = output.effect_decision.expect("proposal passes");
        assert_eq!(decision.effect, EffectKind::AcidSweep);
        assert_eq!(output.debug_info.gate, GateOutcome::Approved);
    }
    assert_eq!(engine.gatekeeper().last_fired(EffectKind::AcidSweep), None);
    assert_eq!(engine.stats().strikes_executed, 0);

    confirmations
        .confirm(EffectFiredEvent {
            id: 7,
            effect: EffectKind::AcidSweep,
            timestamp_ms: 100,
        })
        .unwrap();

    let output = engine.process(&frame(Vibe::TechnoClub, 0.5, 200)).await;
    assert!(output.effect_decision.is_none());
    match &output.debug_info.gate {
        GateOutcome::Blocked(reason) => {
            assert!(reason.starts_with("BLOCKED:"));
            assert!(reason.contains("cooldown"));
        }
        other => panic!("expected a cooldown block, got {:?}", other),
    }

    // Same physical firing reported twice
    assert!(!engine.register_effect_fired(EffectFiredEvent {
        id: 7,
        effect: EffectKind::AcidSweep,
        timestamp_ms: 5_000,
    }));
    assert_eq!(engine.gatekeeper().last_fired(EffectKind::AcidSweep), Some(100));
    assert_eq!(usage.len(), 1);
    assert_eq!(engine.stats().strikes_executed, 1);

    // 12000ms base cooldown scaled by the balanced mood
    let output = engine.process(&frame(Vibe::TechnoClub, 0.5, 100 + 14_400)).await;
    assert!(output.effect_decision.is_some());
}

#[tokio::test]
async fn test_arsenal_exhaustion_is_silence() {
    let mut engine = ConsciousEngine::new(EngineConfig::default())
        .unwrap()
        .with_decision_maker(AlwaysDivine);
    let arsenal = divine_arsenal(Vibe::FiestaLatina);

    for (i, expected) in arsenal.iter().enumerate() {
        let t = i as u64 * 1_000;
        let output = engine.process(&frame(Vibe::FiestaLatina, 0.5, t)).await;
        let decision = output.effect_decision.expect("arsenal member available");
        assert_eq!(decision.effect, *expected);
        engine.register_effect_fired(EffectFiredEvent {
            id: i as u64,
            effect: decision.effect,
            timestamp_ms: t,
        });
    }

    let output = engine.process(&frame(Vibe::FiestaLatina, 0.5, 4_000)).await;
    assert!(output.effect_decision.is_none());
    assert_eq!(
        output.debug_info.gate,
        GateOutcome::ArsenalExhausted(arsenal.to_vec())
    );
    assert!(output.debug_info.reasoning.contains("ARSENAL EXHAUSTED"));
    assert_eq!(engine.stats().arsenal_exhaustions, 1);
}

#[tokio::test]
async fn test_dna_override_bypasses_cooldown_only() {
    let mut engine = ConsciousEngine::new(always_dream())
        .unwrap()
        .with_decision_maker(Propose(EffectKind::AcidSweep))
        .with_dream_simulator(Arc::new(Approve(0.95)));
    engine.register_effect_fired(EffectFiredEvent {
        id: 1,
        effect: EffectKind::AcidSweep,
        timestamp_ms: 0,
    });

    let output = engine.process(&frame(Vibe::TechnoClub, 0.5, 100)).await;
    assert_eq!(output.debug_info.gate, GateOutcome::DnaOverride);
    assert!(output.effect_decision.is_some());
}

#[tokio::test]
async fn test_dna_override_needs_ethics_above_mood_threshold() {
    let mut engine = ConsciousEngine::new(always_dream())
        .unwrap()
        .with_decision_maker(Propose(EffectKind::AcidSweep))
        .with_dream_simulator(Arc::new(Approve(0.85)));
    engine.register_effect_fired(EffectFiredEvent {
        id: 1,
        effect: EffectKind::AcidSweep,
        timestamp_ms: 0,
    });

    let output = engine.process(&frame(Vibe::TechnoClub, 0.5, 100)).await;
    assert!(output.effect_decision.is_none());
    assert!(matches!(output.debug_info.gate, GateOutcome::Blocked(_)));
}

#[tokio::test]
async fn test_hard_minimum_survives_dna_override() {
    let mut engine = ConsciousEngine::new(always_dream())
        .unwrap()
        .with_decision_maker(Propose(EffectKind::SolarFlare))
        .with_dream_simulator(Arc::new(Approve(0.99)));
    engine.register_effect_fired(EffectFiredEvent {
        id: 1,
        effect: EffectKind::SolarFlare,
        timestamp_ms: 0,
    });

    let output = engine.process(&frame(Vibe::FiestaLatina, 0.5, 1_000)).await;
    match &output.debug_info.gate {
        GateOutcome::Blocked(reason) => assert!(reason.contains("HARD_COOLDOWN")),
        other => panic!("expected hard minimum block, got {:?}", other),
    }

    let output = engine.process(&frame(Vibe::FiestaLatina, 0.5, 9_000)).await;
    assert_eq!(output.debug_info.gate, GateOutcome::DnaOverride);
}

#[tokio::test]
async fn test_no_dna_override_for_oceanic_effects_in_chill() {
    let mut engine = ConsciousEngine::new(always_dream())
        .unwrap()
        .with_decision_maker(Propose(EffectKind::WhaleSong))
        .with_dream_simulator(Arc::new(Approve(0.99)));
    engine.register_effect_fired(EffectFiredEvent {
        id: 1,
        effect: EffectKind::WhaleSong,
        timestamp_ms: 0,
    });

    let output = engine.process(&frame(Vibe::ChillLounge, 0.5, 100)).await;
    assert!(output.effect_decision.is_none());
}

#[tokio::test]
async fn test_vibe_shield_is_final() {
    let mut engine = ConsciousEngine::new(EngineConfig::default())
        .unwrap()
        .with_decision_maker(Propose(EffectKind::IndustrialStrobe));
    let output = engine.process(&frame(Vibe::ChillLounge, 0.5, 0)).await;
    assert!(output.effect_decision.is_none());
    assert_eq!(engine.stats().effects_blocked, 1);
}

#[tokio::test]
async fn test_dictator_suppresses_dream_and_effects() {
    let lock = DictatorLock::new();
    lock.set(true);
    let mut engine = ConsciousEngine::new(always_dream())
        .unwrap()
        .with_decision_maker(Propose(EffectKind::AcidSweep))
        .with_dream_simulator(Arc::new(ScenarioDreamSimulator))
        .with_effect_manager(Arc::new(lock.clone()));

    let output = engine.process(&frame(Vibe::TechnoClub, 0.5, 0)).await;
    assert_eq!(output.debug_info.gate, GateOutcome::DictatorActive);
    assert!(output.effect_decision.is_none());
    assert_eq!(engine.stats().dreams_simulated, 0);

    lock.set(false);
    let output = engine.process(&frame(Vibe::TechnoClub, 0.5, 33)).await;
    assert!(output.effect_decision.is_some());
    assert_eq!(engine.stats().dreams_simulated, 1);
}

#[tokio::test]
async fn test_default_engine_mirrors_hunt_phase() {
    let mut engine = ConsciousEngine::new(EngineConfig::default()).unwrap();
    let mut building = frame(Vibe::TechnoClub, 0.5, 0);
    building.section_type = "buildup".into();
    let output = engine.process(&building).await;

    assert_eq!(engine.state().hunt_phase, HuntPhase::Stalking);
    assert_eq!(output.debug_info.hunt_phase, Some(HuntPhase::Stalking));
    assert_eq!(engine.hunt_state().phase, HuntPhase::Stalking);
}

#[tokio::test]
async fn test_statistical_drop_triggers_divine_strike() {
    let mut engine = ConsciousEngine::new(EngineConfig::default()).unwrap();
    for i in 0..30u64 {
        let energy = if i % 2 == 0 { 0.28 } else { 0.32 };
        engine.process(&frame(Vibe::TechnoClub, energy, i * 33)).await;
    }

    let mut drop = frame(Vibe::TechnoClub, 0.8, 30 * 33);
    drop.section_type = "drop".into();
    drop.has_kick = true;
    let output = engine.process(&drop).await;

    assert_eq!(output.source, DecisionSource::DropBridge);
    assert!(output.debug_info.z_score >= 3.0);
    let decision = output.effect_decision.expect("divine strike fires");
    assert!(divine_arsenal(Vibe::TechnoClub).contains(&decision.effect));
    assert_eq!(output.physics_modifier.unwrap().flash_intensity, 1.0);
}

#[tokio::test]
async fn test_divine_arsenal_respects_vibe_shield() {
    let mut engine = ConsciousEngine::new(EngineConfig::default())
        .unwrap()
        .with_decision_maker(Divine(vec![EffectKind::CumbiaMoon, EffectKind::AcidSweep]));

    let output = engine.process(&frame(Vibe::TechnoClub, 0.5, 0)).await;
    let decision = output.effect_decision.expect("in-vibe member fires");
    assert_eq!(decision.effect, EffectKind::AcidSweep);
    assert_eq!(output.debug_info.gate, GateOutcome::Approved);
}

#[tokio::test]
async fn test_out_of_vibe_arsenal_is_exhausted() {
    // An approving simulation does not open the vibe shield either
    let mut engine = ConsciousEngine::new(always_dream())
        .unwrap()
        .with_decision_maker(Divine(vec![EffectKind::CumbiaMoon]))
        .with_dream_simulator(Arc::new(Approve(0.95)));

    let output = engine.process(&frame(Vibe::TechnoClub, 0.5, 0)).await;
    assert!(output.effect_decision.is_none());
    assert_eq!(
        output.debug_info.gate,
        GateOutcome::ArsenalExhausted(vec![EffectKind::CumbiaMoon])
    );
    assert_eq!(engine.stats().strikes_executed, 0);
}

#[tokio::test]
async fn test_disabled_engine_still_registers_confirmations() {
    let mut engine = ConsciousEngine::new(EngineConfig::default()).unwrap();
    let confirmations = engine.confirmation_sender();
    engine.set_enabled(false);

    confirmations
        .confirm(EffectFiredEvent {
            id: 3,
            effect: EffectKind::AcidSweep,
            timestamp_ms: 50,
        })
        .unwrap();
    engine.process(&frame(Vibe::TechnoClub, 0.5, 66)).await;

    assert_eq!(engine.gatekeeper().last_fired(EffectKind::AcidSweep), Some(50));
    assert_eq!(engine.stats().strikes_executed, 1);
    assert_eq!(engine.stats().frames_processed, 0);
}

#[tokio::test]
async fn test_bias_detector_sees_validated_colour() {
    let mut engine = ConsciousEngine::new(EngineConfig::default())
        .unwrap()
        .with_decision_maker(PaintHue(10.0))
        .with_constitution_guard(NoHues);

    let mut last = None;
    for i in 0..30u64 {
        last = Some(engine.process(&frame(Vibe::PopRock, 0.5, i * 33)).await);
    }
    let output = last.unwrap();
    assert_eq!(output.color_decision.unwrap().suggested_hue, None);
    assert_eq!(engine.stats().constitution_violations_avoided, 30);

    // Every raw suggestion was the same hue; none of them reached the output
    let report = engine.bias_report().expect("analysis ran at frame 30");
    assert!(report
        .biases
        .iter()
        .all(|b| b.bias_type != BiasType::HuePreference && b.bias_type != BiasType::RiskAversion));
}
