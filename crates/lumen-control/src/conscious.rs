//! The conscious engine: Sense → Think → Dream → Validate, once per frame.
//!
//! [`ConsciousEngine`] owns every piece of mutable session state (sensors,
//! hunt FSM, z-score memory, cooldowns, bias window) and mutates it only from
//! [`ConsciousEngine::process`] and [`ConsciousEngine::register_effect_fired`].
//! The only suspension point is the dream race.

use crate::decision::{
    select_effect_by_vibe, DecisionInputs, DecisionMaker, HuntDecisionMaker, RawDecision,
};
use crate::dream::{simulate_with_deadline, DreamOutcome, DreamRequest, DreamSimulator};
use crate::error::Result;
use crate::hardware::{
    confirmation_channel, ConfirmationReceiver, ConfirmationSender, EffectFiredEvent,
    EffectManager, NoDictator, NullUsageRecorder, UsageRecorder,
};
use crate::output::{
    ConsciousnessOutput, DebugInfo, DecisionSource, EffectDecision, GateOutcome, PhysicsModifier,
};
use lumen_core::gatekeeper::{curate, is_oceanic, AvailabilityReason};
use lumen_core::{
    AlertLevel, AudioFrame, BeautyAnalysis, BeautySensor, BiasAnalysis, BiasDetector,
    ColorDecision, ConsonanceAnalysis, ConsonanceSensor, Constitution, ConstitutionGuard,
    ContextualMemory, DecisionRecord, DefaultConstitutionGuard, DropBridge, DropBridgeInput,
    EffectGatekeeper, EffectKind, EnergyZoneTracker, EngineConfig, FuzzyDecisionMaker,
    FuzzyInput, HuntEngine, HuntInput, HuntPhase, HuntState, MemoryInput, Mood, MoodPolicy,
    MusicalPattern, PatternSensor, PredictionEngine, PredictionKind, SpectralBuildupDetector,
    SpectralContext, Vibe, Zone,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Confirmed firings remembered for diversity scoring.
const RECENT_EFFECTS_CAPACITY: usize = 20;
/// Proposals remembered for diagnostics.
const PROPOSAL_HISTORY_CAPACITY: usize = 20;
/// Candidates handed to the dream simulator.
const MAX_DREAM_CANDIDATES: usize = 5;
/// Zone-change logs allowed between two periodic status logs.
const ZONE_LOG_BURST: u32 = 5;
/// Minimum frame time between two silence/blocked logs.
const SILENCE_LOG_INTERVAL_MS: u64 = 5_000;

/// Session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsciousStats {
    pub frames_processed: u64,
    pub decisions_applied: u64,
    pub decisions_rejected: u64,
    pub energy_overrides: u64,
    pub constitution_violations_avoided: u64,
    /// Confirmed firings, not proposals
    pub strikes_executed: u64,
    pub dreams_simulated: u64,
    pub dream_timeouts: u64,
    pub biases_detected: u64,
    pub arsenal_exhaustions: u64,
    pub effects_blocked: u64,
}

/// Trailing per-session state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsciousState {
    pub vibe: Vibe,
    pub mood: Mood,
    /// Mirror of the hunt FSM phase after the last frame
    pub hunt_phase: HuntPhase,
    pub zone: Zone,
    /// Last `energy_trend_window` energies, oldest first
    pub energy_trend: VecDeque<f32>,
    /// Confirmed firings, oldest first
    pub recent_effects: VecDeque<EffectKind>,
    /// Emitted proposals with their frame time, oldest first
    pub proposed_effects: VecDeque<(EffectKind, u64)>,
    pub last_pattern: Option<MusicalPattern>,
}

impl ConsciousState {
    /// Slope of the trailing energy window (last minus first)
    pub fn energy_slope(&self) -> f32 {
        match (self.energy_trend.front(), self.energy_trend.back()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

/// Log throttling bookkeeping.
#[derive(Debug, Default)]
struct LogThrottle {
    last_zone: Option<Zone>,
    zone_logs: u32,
    last_silence_log_ms: Option<u64>,
}

impl LogThrottle {
    fn silence_due(&mut self, now_ms: u64) -> bool {
        let due = self
            .last_silence_log_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= SILENCE_LOG_INTERVAL_MS);
        if due {
            self.last_silence_log_ms = Some(now_ms);
        }
        due
    }
}

/// Session-scoped decision engine.
pub struct ConsciousEngine {
    config: EngineConfig,
    mood_policy: Box<dyn MoodPolicy>,
    constitution: Constitution,

    pattern_sensor: PatternSensor,
    beauty_sensor: BeautySensor,
    consonance_sensor: ConsonanceSensor,
    memory: ContextualMemory,
    hunt: HuntEngine,
    prediction: PredictionEngine,
    buildup: SpectralBuildupDetector,
    zones: EnergyZoneTracker,
    drop_bridge: DropBridge,
    fuzzy: FuzzyDecisionMaker,
    bias: BiasDetector,
    gatekeeper: EffectGatekeeper,

    decision_maker: Box<dyn DecisionMaker>,
    dream_simulator: Option<Arc<dyn DreamSimulator>>,
    effect_manager: Arc<dyn EffectManager>,
    usage_recorder: Arc<dyn UsageRecorder>,
    constitution_guard: Box<dyn ConstitutionGuard>,
    confirmation_tx: ConfirmationSender,
    confirmation_rx: ConfirmationReceiver,

    state: ConsciousState,
    stats: ConsciousStats,
    last_output: Option<ConsciousnessOutput>,
    throttle: LogThrottle,
}

impl ConsciousEngine {
    /// Engine with built-in collaborators: no dictator, no dream simulator,
    /// default decision maker and constitution guard.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let (confirmation_tx, confirmation_rx) = confirmation_channel();
        let session = config.session.clone();

        Ok(Self {
            mood_policy: Box::new(session.mood.profile()),
            constitution: session.constitution,
            pattern_sensor: PatternSensor::new(),
            beauty_sensor: BeautySensor::new(),
            consonance_sensor: ConsonanceSensor::new(),
            memory: ContextualMemory::new(config.memory),
            hunt: HuntEngine::new(config.hunt),
            prediction: PredictionEngine::new(),
            buildup: SpectralBuildupDetector::new(),
            zones: EnergyZoneTracker::new(config.energy),
            drop_bridge: DropBridge::new(config.drop_bridge.clone()),
            fuzzy: FuzzyDecisionMaker::new(),
            bias: BiasDetector::new(config.bias),
            gatekeeper: EffectGatekeeper::new(),
            decision_maker: Box::new(HuntDecisionMaker::default()),
            dream_simulator: None,
            effect_manager: Arc::new(NoDictator),
            usage_recorder: Arc::new(NullUsageRecorder),
            constitution_guard: Box::new(DefaultConstitutionGuard),
            confirmation_tx,
            confirmation_rx,
            state: ConsciousState {
                vibe: session.vibe,
                mood: session.mood,
                ..Default::default()
            },
            stats: ConsciousStats::default(),
            last_output: None,
            throttle: LogThrottle::default(),
            config,
        })
    }

    pub fn with_decision_maker(mut self, decision_maker: impl DecisionMaker + 'static) -> Self {
        self.decision_maker = Box::new(decision_maker);
        self
    }

    pub fn with_dream_simulator(mut self, simulator: Arc<dyn DreamSimulator>) -> Self {
        self.dream_simulator = Some(simulator);
        self
    }

    pub fn with_effect_manager(mut self, manager: Arc<dyn EffectManager>) -> Self {
        self.effect_manager = manager;
        self
    }

    pub fn with_usage_recorder(mut self, recorder: Arc<dyn UsageRecorder>) -> Self {
        self.usage_recorder = recorder;
        self
    }

    pub fn with_constitution_guard(mut self, guard: impl ConstitutionGuard + 'static) -> Self {
        self.constitution_guard = Box::new(guard);
        self
    }

    /// Replace the built-in mood profile with a custom policy
    pub fn with_mood_policy(mut self, policy: impl MoodPolicy + 'static) -> Self {
        self.state.mood = policy.mood();
        self.mood_policy = Box::new(policy);
        self
    }

    /// Run the full pipeline for one frame.
    pub async fn process(&mut self, frame: &AudioFrame) -> ConsciousnessOutput {
        let now = frame.timestamp_ms;

        for event in self.confirmation_rx.drain() {
            self.register_effect_fired(event);
        }

        if !self.config.engine.enabled {
            return self
                .last_output
                .clone()
                .unwrap_or_else(|| ConsciousnessOutput::empty(now));
        }
        self.stats.frames_processed += 1;
        let vibe = frame.vibe.unwrap_or(self.state.vibe);

        // Physics veto: nothing downstream may override it
        if frame.energy > self.config.engine.energy_override_threshold {
            let output = self.energy_override(frame);
            self.last_output = Some(output.clone());
            return output;
        }

        // Sense
        let mut pattern = self.pattern_sensor.sense(frame, vibe);
        let memory = self.memory.update(MemoryInput {
            energy: frame.energy,
            bass: frame.bass,
            harshness: frame.harshness,
            section: pattern.section,
        });
        pattern.energy_z_score = memory.energy.z_score;
        if memory.anomaly.is_anomaly {
            debug!("Anomaly: {}", memory.anomaly.reason);
        }
        let (beauty, consonance) = match &frame.palette {
            Some(palette) => (
                self.beauty_sensor.sense(palette, &pattern),
                self.consonance_sensor.sense(palette, &pattern),
            ),
            None => (BeautyAnalysis::neutral(now), ConsonanceAnalysis::neutral(now)),
        };

        // Think
        let spectral = SpectralContext::from_frame(frame);
        let hunt = self.hunt.process(&HuntInput::from_analysis(
            &pattern,
            &beauty,
            &consonance,
            Some(spectral),
        ));
        let buildup_score =
            self.buildup
                .update(frame.spectral_centroid, frame.spectral_flatness, frame.bass);
        let prediction = self
            .prediction
            .predict_combined(&pattern, frame.energy, buildup_score);
        let energy = self.zones.process(frame.raw_energy, now);
        let bridge = self.drop_bridge.check(
            &DropBridgeInput {
                energy_z_score: pattern.energy_z_score,
                section: pattern.section,
                raw_energy: frame.raw_energy,
                has_kick: frame.has_kick,
                harshness: Some(frame.harshness),
            },
            now,
        );
        let fuzzy = self.fuzzy.evaluate(&FuzzyInput {
            energy: frame.energy,
            z_score: pattern.energy_z_score,
            section: pattern.section,
            harshness: frame.harshness,
            hunt_score: hunt.worthiness,
            beauty: beauty.total_beauty,
        });
        self.log_zone(energy.zone, energy.previous_zone);

        // Dream
        let dictator = self.effect_manager.has_dictator();
        let dream = if hunt.worthiness >= self.config.engine.dream_worthiness_threshold && !dictator {
            let drop_coming = prediction
                .as_ref()
                .is_some_and(|p| p.kind == PredictionKind::DropIncoming)
                || matches!(bridge.alert_level, AlertLevel::Imminent | AlertLevel::Activated);
            let request = DreamRequest {
                vibe,
                beauty: beauty.total_beauty,
                consonance: consonance.total_consonance,
                worthiness: hunt.worthiness,
                harshness: frame.harshness,
                drop_coming,
                candidates: self.dream_candidates(&pattern, &beauty, &hunt, energy.zone),
                recent_effects: self.state.recent_effects.iter().copied().collect(),
                spectral,
                timestamp_ms: now,
            };
            self.dream(request).await
        } else {
            None
        };

        let raw = {
            let inputs = DecisionInputs {
                pattern: &pattern,
                beauty: &beauty,
                consonance: &consonance,
                hunt: &hunt,
                prediction: prediction.as_ref(),
                fuzzy: &fuzzy,
                drop_bridge: &bridge,
                energy: &energy,
                z_score: pattern.energy_z_score,
                spectral: &spectral,
                dream: dream.as_ref(),
                dictator_active: dictator,
                gatekeeper: &self.gatekeeper,
                mood: self.mood_policy.as_ref(),
            };
            self.decision_maker.decide(&inputs)
        };

        // Gate
        let (effect_decision, gate) =
            self.resolve_effect(&raw, vibe, &spectral, dream.as_ref(), dictator, now);

        // Dream stage bookkeeping and validation
        let color_decision = raw.color.map(|color| self.validate_color(color));
        self.bias.record(DecisionRecord::from_output(
            color_decision.as_ref(),
            raw.confidence,
            now,
        ));
        self.analyze_bias_if_due();

        // Trailing state
        self.state.energy_trend.push_back(frame.energy);
        while self.state.energy_trend.len() > self.config.engine.energy_trend_window {
            self.state.energy_trend.pop_front();
        }
        if let Some(decision) = &effect_decision {
            self.state.proposed_effects.push_back((decision.effect, now));
            while self.state.proposed_effects.len() > PROPOSAL_HISTORY_CAPACITY {
                self.state.proposed_effects.pop_front();
            }
        }
        self.state.hunt_phase = hunt.phase;
        self.state.zone = energy.zone;
        self.state.vibe = vibe;

        let active_prediction = prediction
            .filter(|p| p.probability > self.config.engine.prediction_report_threshold);
        let reasoning = match &gate {
            GateOutcome::Blocked(reason) => format!("{} | {}", raw.reasoning, reason),
            GateOutcome::ArsenalExhausted(_) => format!("{} | ARSENAL EXHAUSTED", raw.reasoning),
            GateOutcome::DictatorActive => format!("{} | DICTATOR ACTIVE", raw.reasoning),
            _ => raw.reasoning.clone(),
        };

        let output = ConsciousnessOutput {
            timestamp_ms: now,
            effect_decision,
            color_decision,
            physics_modifier: raw.physics,
            confidence: raw.confidence,
            source: raw.source,
            debug_info: DebugInfo {
                reasoning,
                active_prediction,
                zone: Some(energy.zone),
                hunt_phase: Some(hunt.phase),
                gate,
                worthiness: hunt.worthiness,
                z_score: pattern.energy_z_score,
                biases: self.bias.bias_strings(),
            },
        };

        if output.confidence >= self.config.engine.min_confidence {
            self.stats.decisions_applied += 1;
        } else {
            self.stats.decisions_rejected += 1;
        }

        if self.stats.frames_processed % self.config.engine.log_interval_frames.max(1) == 0 {
            info!(
                "Hunt={} zone={} worthiness={:.2} z={:.2} beauty={:.2} conf={:.2}",
                hunt.phase,
                energy.zone,
                hunt.worthiness,
                pattern.energy_z_score,
                beauty.total_beauty,
                output.confidence
            );
            self.throttle.zone_logs = 0;
        }

        self.state.last_pattern = Some(pattern);
        self.last_output = Some(output.clone());
        output
    }

    fn energy_override(&mut self, frame: &AudioFrame) -> ConsciousnessOutput {
        self.stats.energy_overrides += 1;
        let reasoning = format!(
            "ENERGY OVERRIDE: energy {:.2} > {:.2} (physics veto)",
            frame.energy, self.config.engine.energy_override_threshold
        );
        if self.stats.energy_overrides % self.config.engine.log_interval_frames.max(1) == 1 {
            info!("{}", reasoning);
        }
        ConsciousnessOutput {
            timestamp_ms: frame.timestamp_ms,
            effect_decision: None,
            color_decision: Some(ColorDecision {
                saturation_mod: Some(1.1),
                brightness_mod: Some(1.2),
                confidence: 1.0,
                ..Default::default()
            }),
            physics_modifier: Some(PhysicsModifier {
                strobe_intensity: 1.0,
                flash_intensity: 1.0,
                confidence: 1.0,
            }),
            confidence: 1.0,
            source: DecisionSource::EnergyOverride,
            debug_info: DebugInfo {
                reasoning,
                hunt_phase: Some(self.state.hunt_phase),
                zone: Some(self.state.zone),
                ..Default::default()
            },
        }
    }

    fn dream_candidates(
        &self,
        pattern: &MusicalPattern,
        beauty: &BeautyAnalysis,
        hunt: &lumen_core::HuntDecision,
        zone: Zone,
    ) -> Vec<EffectKind> {
        let strike_intensity = pattern.emotional_tension.max(0.7);
        let mut candidates: Vec<EffectKind> = select_effect_by_vibe(
            pattern.vibe,
            strike_intensity,
            hunt.conditions.as_ref(),
            beauty,
        )
        .map(|s| s.effect)
        .into_iter()
        .collect();
        for effect in self.gatekeeper.effects_allowed_for_zone(zone, pattern.vibe) {
            if candidates.len() >= MAX_DREAM_CANDIDATES {
                break;
            }
            if !candidates.contains(&effect) {
                candidates.push(effect);
            }
        }
        candidates
    }

    async fn dream(&mut self, request: DreamRequest) -> Option<DreamOutcome> {
        let simulator = self.dream_simulator.clone()?;
        if request.candidates.is_empty() {
            trace!("Dream skipped: no candidates");
            return None;
        }
        self.stats.dreams_simulated += 1;
        let deadline = Duration::from_millis(self.config.engine.dream_deadline_ms);
        let outcome = simulate_with_deadline(simulator.as_ref(), request, deadline).await;
        if outcome == DreamOutcome::TimedOut {
            self.stats.dream_timeouts += 1;
        }
        Some(outcome)
    }

    /// Divine arsenal or single-effect gating. Any failure is silence.
    fn resolve_effect(
        &mut self,
        raw: &RawDecision,
        vibe: Vibe,
        spectral: &SpectralContext,
        dream: Option<&DreamOutcome>,
        dictator: bool,
        now: u64,
    ) -> (Option<EffectDecision>, GateOutcome) {
        if raw.divine.is_none() && raw.effect.is_none() {
            return (None, GateOutcome::NoProposal);
        }
        if dictator {
            self.stats.effects_blocked += 1;
            if self.throttle.silence_due(now) {
                debug!("Silence: dictator holds the fixtures");
            }
            return (None, GateOutcome::DictatorActive);
        }

        let (mut decision, gate) = if let Some(divine) = &raw.divine {
            match self.gatekeeper.first_available_from_arsenal(
                &divine.arsenal,
                vibe,
                self.mood_policy.as_ref(),
                Some(spectral),
                now,
            ) {
                Ok(effect) => (
                    EffectDecision {
                        effect,
                        intensity: divine.intensity,
                        confidence: raw.confidence,
                        reason: format!("{} -> {}", divine.reason, effect),
                    },
                    GateOutcome::Approved,
                ),
                Err(exhausted) => {
                    self.stats.arsenal_exhaustions += 1;
                    if self.throttle.silence_due(now) {
                        warn!("Divine strike silenced: {}", exhausted);
                    }
                    return (None, GateOutcome::ArsenalExhausted(exhausted.arsenal));
                }
            }
        } else if let Some(proposal) = &raw.effect {
            match self.gate_single(proposal.effect, vibe, spectral, dream, now) {
                Ok(gate) => (proposal.clone(), gate),
                Err(reason) => {
                    self.stats.effects_blocked += 1;
                    if self.throttle.silence_due(now) {
                        debug!("Silence: {}", reason);
                    }
                    return (None, GateOutcome::Blocked(reason));
                }
            }
        } else {
            return (None, GateOutcome::NoProposal);
        };

        decision.intensity = self.mood_policy.apply_intensity(decision.intensity);
        (Some(decision), gate)
    }

    /// Vibe shield, availability (with DNA override), hard minimum, texture.
    fn gate_single(
        &self,
        effect: EffectKind,
        vibe: Vibe,
        spectral: &SpectralContext,
        dream: Option<&DreamOutcome>,
        now: u64,
    ) -> std::result::Result<GateOutcome, String> {
        if !self.gatekeeper.is_in_vibe_arsenal(effect, vibe) {
            return Err(format!("BLOCKED: {} outside the {} arsenal", effect, vibe));
        }

        let mood = self.mood_policy.as_ref();
        let availability = self.gatekeeper.check_availability(effect, vibe, mood, now);
        let mut gate = GateOutcome::Approved;
        if !availability.available {
            if availability.kind == AvailabilityReason::Cooldown
                && self.dna_override_allowed(effect, vibe, dream)
            {
                debug!("DNA override: {} ({})", effect, availability.reason);
                gate = GateOutcome::DnaOverride;
            } else {
                return Err(format!("BLOCKED: {}", availability.reason));
            }
        }

        let hard = self.gatekeeper.check_hard_minimum(effect, now);
        if !hard.available {
            return Err(format!("BLOCKED: {}", hard.reason));
        }

        let texture = curate(effect, spectral);
        if !texture.allowed {
            return Err(format!(
                "BLOCKED: {} incompatible with {:?} texture",
                effect, spectral.texture
            ));
        }
        Ok(gate)
    }

    fn dna_override_allowed(&self, effect: EffectKind, vibe: Vibe, dream: Option<&DreamOutcome>) -> bool {
        let Some(verdict) = dream.and_then(|d| d.approved()) else {
            return false;
        };
        let endorses = verdict.suggested_effect.map_or(true, |s| s == effect);
        let oceanic_in_chill = vibe == Vibe::ChillLounge && is_oceanic(effect);
        endorses
            && verdict.ethical_score > self.mood_policy.ethics_threshold()
            && !oceanic_in_chill
    }

    fn validate_color(&mut self, color: ColorDecision) -> ColorDecision {
        let result = self.constitution_guard.validate(&color, &self.constitution);
        if result.is_valid {
            return color;
        }
        self.stats.constitution_violations_avoided += result.violations.len() as u64;
        for violation in &result.violations {
            trace!("Constitution: {}", violation.description);
        }
        result.corrected.unwrap_or(color)
    }

    fn analyze_bias_if_due(&mut self) {
        if self.stats.frames_processed % self.config.engine.bias_analysis_interval != 0 {
            return;
        }
        let Some(analysis) = self.bias.analyze() else {
            return;
        };
        self.stats.biases_detected += analysis.biases.len() as u64;
        if analysis.has_critical_bias {
            warn!(
                "Critical bias detected (health {:.2}): {:?}",
                analysis.cognitive_health,
                self.bias.bias_strings()
            );
        }
    }

    fn log_zone(&mut self, zone: Zone, previous: Zone) {
        if self.throttle.last_zone == Some(zone) {
            return;
        }
        self.throttle.last_zone = Some(zone);
        self.throttle.zone_logs += 1;
        if self.throttle.zone_logs <= ZONE_LOG_BURST {
            debug!("Zone {} -> {}", previous, zone);
        } else {
            trace!("Zone {} -> {}", previous, zone);
        }
    }

    /// Register a confirmed firing. Returns `false` for a duplicate event id.
    pub fn register_effect_fired(&mut self, event: EffectFiredEvent) -> bool {
        if !self.gatekeeper.register_effect_fired(event) {
            return false;
        }
        self.usage_recorder
            .record_effect_usage(event.effect, event.timestamp_ms);
        self.state.recent_effects.push_back(event.effect);
        while self.state.recent_effects.len() > RECENT_EFFECTS_CAPACITY {
            self.state.recent_effects.pop_front();
        }
        self.stats.strikes_executed += 1;
        true
    }

    /// Sender handed to the hardware side; confirmations are drained at the
    /// start of every frame
    pub fn confirmation_sender(&self) -> ConfirmationSender {
        self.confirmation_tx.clone()
    }

    pub fn set_vibe(&mut self, vibe: Vibe) {
        if self.state.vibe != vibe {
            info!("Vibe {} -> {}", self.state.vibe, vibe);
        }
        self.state.vibe = vibe;
    }

    pub fn set_mood(&mut self, mood: Mood) {
        if self.state.mood != mood {
            info!("Mood {} -> {}", self.state.mood, mood);
        }
        self.state.mood = mood;
        self.mood_policy = Box::new(mood.profile());
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.engine.enabled = enabled;
    }

    pub fn set_constitution(&mut self, constitution: Constitution) {
        self.constitution = constitution;
    }

    pub fn stats(&self) -> ConsciousStats {
        self.stats
    }

    pub fn state(&self) -> &ConsciousState {
        &self.state
    }

    pub fn hunt_state(&self) -> &HuntState {
        self.hunt.state()
    }

    pub fn gatekeeper(&self) -> &EffectGatekeeper {
        &self.gatekeeper
    }

    pub fn last_output(&self) -> Option<&ConsciousnessOutput> {
        self.last_output.as_ref()
    }

    /// Latest bias analysis, if one has run
    pub fn bias_report(&self) -> Option<&BiasAnalysis> {
        self.bias.last_analysis()
    }

    /// New song: every component, cooldown and counter starts over.
    /// Vibe, mood and constitution are kept.
    pub fn reset(&mut self) {
        self.pattern_sensor.reset();
        self.beauty_sensor.reset();
        self.consonance_sensor.reset();
        self.memory.reset();
        self.hunt.reset();
        self.prediction.reset();
        self.buildup.reset();
        self.zones.reset();
        self.drop_bridge.reset();
        self.fuzzy.reset();
        self.bias.reset();
        self.gatekeeper.reset();
        // Stale confirmations belong to the previous song
        self.confirmation_rx.drain();

        self.state = ConsciousState {
            vibe: self.state.vibe,
            mood: self.state.mood,
            ..Default::default()
        };
        self.stats = ConsciousStats::default();
        self.last_output = None;
        self.throttle = LogThrottle::default();
        info!("Engine reset");
    }
}
