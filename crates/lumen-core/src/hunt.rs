//! Hunt engine: a predator-style state machine deciding when a moment is worth it.
//!
//! ```text
//! sleeping ──▶ stalking ──▶ evaluating ──▶ striking ──▶ learning
//!    ▲            │  ▲           │                          │
//!    └────────────┘  └───────────┘◀─────────────────────────┘
//! ```
//!
//! The engine never fires anything. It reports a phase and a worthiness score
//! every frame and leaves the final call to the decision maker.

use crate::frame::SpectralContext;
use crate::sense::{BeautyAnalysis, ConsonanceAnalysis, MusicalPattern};
use crate::types::{clamp01, HuntPhase, SectionType, Texture, Trend, Vibe};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

const MAX_WORTHINESS_HISTORY: usize = 15;

/// Thresholds and timings of the hunt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuntConfig {
    /// Frames to stalk before evaluation is allowed
    pub min_stalking_frames: u32,
    /// Frames of low worthiness before giving up and sleeping
    pub max_stalking_frames: u32,
    /// Beauty required for a strike
    pub beauty_threshold: f32,
    /// Consonance considered "met"
    pub consonance_threshold: f32,
    /// Urgency that forces a strike when beauty is met
    pub urgency_force_threshold: f32,
    /// Evaluation timeout in frames
    pub max_evaluating_frames: u32,
    /// Refractory period after a strike in frames
    pub learning_cooldown_frames: u32,
    /// Worthiness that wakes the engine
    pub wake_threshold: f32,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            min_stalking_frames: 5,
            max_stalking_frames: 60,
            beauty_threshold: 0.65,
            consonance_threshold: 0.60,
            urgency_force_threshold: 0.90,
            max_evaluating_frames: 15,
            learning_cooldown_frames: 120,
            wake_threshold: 0.35,
        }
    }
}

/// Per-vibe strike-score weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VibeWeights {
    /// Beauty weight
    pub beauty: f32,
    /// Urgency weight
    pub urgency: f32,
    /// Consonance weight
    pub consonance: f32,
    /// Strike-score threshold
    pub threshold: f32,
    /// Added to urgency before weighting
    pub urgency_boost: f32,
}

impl VibeWeights {
    /// Weight table
    pub fn for_vibe(vibe: Vibe) -> Self {
        let (beauty, urgency, consonance, threshold, urgency_boost) = match vibe {
            Vibe::FiestaLatina => (0.3, 0.6, 0.1, 0.65, 0.1),
            Vibe::TechnoClub => (0.2, 0.7, 0.1, 0.65, 0.1),
            Vibe::PopRock => (0.4, 0.5, 0.1, 0.70, 0.0),
            Vibe::ChillLounge => (0.7, 0.2, 0.1, 0.75, 0.0),
            Vibe::Idle => (0.4, 0.5, 0.1, 0.75, 0.0),
        };
        Self {
            beauty,
            urgency,
            consonance,
            threshold,
            urgency_boost,
        }
    }
}

/// Everything the hunt reads from one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HuntInput {
    /// Active vibe
    pub vibe: Vibe,
    /// Current section
    pub section: SectionType,
    /// Energy rising
    pub is_building: bool,
    /// Total beauty
    pub beauty: f32,
    /// Beauty trend
    pub beauty_trend: Trend,
    /// Total consonance
    pub consonance: f32,
    /// Emotional tension
    pub tension: f32,
    /// Rhythmic intensity
    pub rhythm: f32,
    /// Optional spectral hint
    pub spectral: Option<SpectralContext>,
    /// Frame timestamp
    pub timestamp_ms: u64,
}

impl HuntInput {
    /// Assemble the hunt input from sensor output
    pub fn from_analysis(
        pattern: &MusicalPattern,
        beauty: &BeautyAnalysis,
        consonance: &ConsonanceAnalysis,
        spectral: Option<SpectralContext>,
    ) -> Self {
        Self {
            vibe: pattern.vibe,
            section: pattern.section,
            is_building: pattern.is_building,
            beauty: beauty.total_beauty,
            beauty_trend: beauty.trend,
            consonance: consonance.total_consonance,
            tension: pattern.emotional_tension,
            rhythm: pattern.rhythmic_intensity,
            spectral,
            timestamp_ms: pattern.timestamp_ms,
        }
    }
}

/// The moment currently being stalked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HuntCandidate {
    /// When stalking began
    pub started_ms: u64,
    /// Frames observed
    pub frames_observed: u32,
    /// Latest worthiness
    pub worthiness: f32,
    /// Trend of the worthiness history
    pub trend: Trend,
}

/// FSM memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HuntState {
    /// Current phase
    pub phase: HuntPhase,
    /// Frames spent in the current phase
    pub frames_in_phase: u32,
    /// Candidate, only present while stalking or evaluating
    pub active_candidate: Option<HuntCandidate>,
    /// Last worthiness values (at most 15)
    pub worthiness_history: VecDeque<f32>,
    /// Strikes since reset
    pub strikes: u32,
    /// Timestamp of the last strike
    pub last_strike_ms: Option<u64>,
}

/// Strike evaluation detail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeConditions {
    /// Beauty at or above the beauty threshold
    pub beauty_met: bool,
    /// Consonance at or above the consonance threshold
    pub consonance_met: bool,
    /// Urgency above 0.5, or a chorus / buildup
    pub urgency_met: bool,
    /// Beauty trend not falling
    pub trend_met: bool,
    /// Strike score reached the vibe threshold
    pub all_met: bool,
    /// Vibe-weighted score
    pub strike_score: f32,
    /// Boosted urgency
    pub urgency: f32,
    /// Vibe threshold used
    pub threshold: f32,
    /// Score with section/trend bonuses
    pub final_score: f32,
}

/// Per-frame report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HuntDecision {
    /// Phase after this frame
    pub phase: HuntPhase,
    /// Worthiness reported for this frame
    pub worthiness: f32,
    /// Confidence of the report
    pub confidence: f32,
    /// Strike evaluation, when evaluating
    pub conditions: Option<StrikeConditions>,
    /// Reasoning for logs
    pub reasoning: String,
}

impl HuntDecision {
    /// The engine entered the strike frame
    pub fn is_striking(&self) -> bool {
        self.phase == HuntPhase::Striking
    }
}

/// Counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HuntStats {
    /// Frames processed
    pub frames_processed: u64,
    /// Strikes executed
    pub strikes: u32,
    /// Phase transitions
    pub transitions: u64,
    /// Evaluations abandoned back to stalking
    pub aborted_evaluations: u32,
}

/// The hunt engine.
#[derive(Debug, Clone, Default)]
pub struct HuntEngine {
    config: HuntConfig,
    state: HuntState,
    stats: HuntStats,
}

impl HuntEngine {
    /// Create an engine with the given configuration
    pub fn new(config: HuntConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Advance the state machine by one frame.
    pub fn process(&mut self, input: &HuntInput) -> HuntDecision {
        self.state.frames_in_phase += 1;
        self.stats.frames_processed += 1;

        let worthiness = self.worthiness(input);
        self.state.worthiness_history.push_back(worthiness);
        while self.state.worthiness_history.len() > MAX_WORTHINESS_HISTORY {
            self.state.worthiness_history.pop_front();
        }

        match self.state.phase {
            HuntPhase::Sleeping => self.sleeping(input, worthiness),
            HuntPhase::Stalking => self.stalking(worthiness, input.timestamp_ms),
            HuntPhase::Evaluating => self.evaluating(input, worthiness),
            HuntPhase::Striking => self.striking(input),
            HuntPhase::Learning => self.learning(worthiness, input.timestamp_ms),
        }
    }

    /// Worthiness of the current moment in `[0, 1]`.
    pub fn worthiness(&self, input: &HuntInput) -> f32 {
        let mut w = input.beauty * 0.35
            + input.consonance * 0.25
            + input.tension * 0.2
            + input.rhythm * 0.2;

        if input.section == SectionType::Buildup || input.is_building {
            w += 0.15;
        }
        if input.section == SectionType::Chorus {
            w += 0.10;
        }
        if input.tension > 0.7 {
            w += 0.10;
        }
        if input.beauty_trend == Trend::Rising {
            w += 0.10;
        }

        if let Some(spectral) = input.spectral {
            let (harsh, clarity) = (spectral.harshness, spectral.clarity);
            // Loud and defined: power, not chaos
            if harsh > 0.5 && clarity > 0.65 && input.tension > 0.6 {
                w += 0.12;
            }
            if clarity > 0.7 && harsh < 0.3 {
                w += 0.08;
            }
            if harsh > 0.6 && clarity < 0.4 {
                w -= 0.15;
            }
            if spectral.texture == Texture::Noisy && clarity < 0.4 {
                w -= 0.10;
            }
        }

        clamp01(w)
    }

    /// Jump straight to `phase` (tests, manual override).
    pub fn force_phase_transition(&mut self, phase: HuntPhase, now_ms: u64) {
        self.transition_to(phase, now_ms, 0.0);
    }

    /// Current FSM memory
    pub fn state(&self) -> &HuntState {
        &self.state
    }

    /// Current phase
    pub fn phase(&self) -> HuntPhase {
        self.state.phase
    }

    /// Counters
    pub fn stats(&self) -> HuntStats {
        self.stats
    }

    /// Back to sleeping with no history
    pub fn reset(&mut self) {
        self.state = HuntState::default();
        self.stats = HuntStats::default();
    }

    fn sleeping(&mut self, input: &HuntInput, worthiness: f32) -> HuntDecision {
        let wakes = worthiness > self.config.wake_threshold
            || input.is_building
            || input.section == SectionType::Buildup;
        if wakes {
            self.transition_to(HuntPhase::Stalking, input.timestamp_ms, worthiness);
            return self.report(
                worthiness,
                0.4,
                None,
                format!("Waking up: worthiness {:.2}", worthiness),
            );
        }
        self.report(0.0, 0.2, None, "Sleeping".to_string())
    }

    fn stalking(&mut self, worthiness: f32, now_ms: u64) -> HuntDecision {
        let trend = self.history_trend();
        if let Some(candidate) = self.state.active_candidate.as_mut() {
            candidate.frames_observed += 1;
            candidate.worthiness = worthiness;
            candidate.trend = trend;
        }

        let frames = self.state.frames_in_phase;
        if frames >= self.config.min_stalking_frames
            && worthiness > self.config.beauty_threshold * 0.8
        {
            self.transition_to(HuntPhase::Evaluating, now_ms, worthiness);
            return self.report(
                worthiness,
                0.5,
                None,
                format!("Candidate promising ({:.2}), evaluating", worthiness),
            );
        }
        if frames > self.config.max_stalking_frames && worthiness < 0.3 {
            self.transition_to(HuntPhase::Sleeping, now_ms, worthiness);
            return self.report(worthiness, 0.2, None, "Lost interest".to_string());
        }
        self.report(
            worthiness,
            0.4,
            None,
            format!("Stalking for {} frames", frames),
        )
    }

    fn evaluating(&mut self, input: &HuntInput, worthiness: f32) -> HuntDecision {
        let conditions = self.strike_conditions(input);
        let frames = self.state.frames_in_phase;

        if conditions.all_met {
            self.transition_to(HuntPhase::Striking, input.timestamp_ms, worthiness);
            return self.report(
                conditions.final_score,
                0.8,
                Some(conditions),
                format!(
                    "STRIKE: score {:.2} >= {:.2}",
                    conditions.strike_score, conditions.threshold
                ),
            );
        }
        if conditions.urgency > self.config.urgency_force_threshold && conditions.beauty_met {
            self.transition_to(HuntPhase::Striking, input.timestamp_ms, worthiness);
            return self.report(
                conditions.strike_score * 0.9,
                0.7,
                Some(conditions),
                format!("Urgent strike: urgency {:.2}", conditions.urgency),
            );
        }
        if frames > self.config.max_evaluating_frames {
            self.stats.aborted_evaluations += 1;
            self.transition_to(HuntPhase::Stalking, input.timestamp_ms, worthiness);
            return self.report(
                conditions.strike_score * 0.5,
                0.3,
                Some(conditions),
                "Evaluation timed out".to_string(),
            );
        }
        if input.beauty_trend == Trend::Falling && conditions.strike_score < 0.5 {
            self.stats.aborted_evaluations += 1;
            self.transition_to(HuntPhase::Stalking, input.timestamp_ms, worthiness);
            return self.report(
                conditions.strike_score * 0.3,
                0.3,
                Some(conditions),
                "Beauty falling, back to stalking".to_string(),
            );
        }
        self.report(
            conditions.strike_score,
            0.5,
            Some(conditions),
            format!(
                "Evaluating: score {:.2} / {:.2}",
                conditions.strike_score, conditions.threshold
            ),
        )
    }

    fn striking(&mut self, input: &HuntInput) -> HuntDecision {
        self.state.strikes += 1;
        self.state.last_strike_ms = Some(input.timestamp_ms);
        self.stats.strikes += 1;
        self.transition_to(HuntPhase::Learning, input.timestamp_ms, 0.0);
        self.report(0.0, 0.8, None, "Strike delivered, learning".to_string())
    }

    fn learning(&mut self, worthiness: f32, now_ms: u64) -> HuntDecision {
        if self.state.frames_in_phase >= self.config.learning_cooldown_frames {
            self.transition_to(HuntPhase::Stalking, now_ms, worthiness);
            return self.report(worthiness, 0.4, None, "Back on the prowl".to_string());
        }
        self.report(0.0, 0.3, None, "Learning".to_string())
    }

    /// Vibe-weighted strike evaluation.
    pub fn strike_conditions(&self, input: &HuntInput) -> StrikeConditions {
        let weights = VibeWeights::for_vibe(input.vibe);
        let urgency = (input.rhythm * 0.5 + input.tension * 0.5 + weights.urgency_boost).min(1.0);
        let strike_score = input.beauty * weights.beauty
            + urgency * weights.urgency
            + input.consonance * weights.consonance;

        let peak_section = matches!(input.section, SectionType::Chorus | SectionType::Buildup);
        let mut final_score = strike_score;
        if peak_section {
            final_score += 0.05;
        }
        if input.beauty_trend == Trend::Rising {
            final_score += 0.05;
        }

        StrikeConditions {
            beauty_met: input.beauty >= self.config.beauty_threshold,
            consonance_met: input.consonance >= self.config.consonance_threshold,
            urgency_met: urgency > 0.5 || peak_section,
            trend_met: input.beauty_trend != Trend::Falling,
            all_met: strike_score >= weights.threshold,
            strike_score,
            urgency,
            threshold: weights.threshold,
            final_score: final_score.min(1.0),
        }
    }

    fn transition_to(&mut self, phase: HuntPhase, now_ms: u64, worthiness: f32) {
        debug!(
            "Hunt: {} -> {} after {} frames",
            self.state.phase, phase, self.state.frames_in_phase
        );
        self.state.phase = phase;
        self.state.frames_in_phase = 0;
        self.stats.transitions += 1;

        match phase {
            HuntPhase::Sleeping | HuntPhase::Learning | HuntPhase::Striking => {
                if phase != HuntPhase::Striking {
                    self.state.worthiness_history.clear();
                }
                self.state.active_candidate = None;
            }
            HuntPhase::Stalking | HuntPhase::Evaluating => {
                if self.state.active_candidate.is_none() {
                    self.state.active_candidate = Some(HuntCandidate {
                        started_ms: now_ms,
                        frames_observed: 0,
                        worthiness,
                        trend: Trend::Stable,
                    });
                }
            }
        }
    }

    fn history_trend(&self) -> Trend {
        let history = &self.state.worthiness_history;
        if history.len() < 3 {
            return Trend::Stable;
        }
        let skip = history.len().saturating_sub(5);
        let mut recent = history.iter().skip(skip);
        let first = recent.next().copied().unwrap_or(0.0);
        let last = recent.last().copied().unwrap_or(first);
        let delta = last - first;
        if delta > 0.05 {
            Trend::Rising
        } else if delta < -0.05 {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }

    fn report(
        &self,
        worthiness: f32,
        confidence: f32,
        conditions: Option<StrikeConditions>,
        reasoning: String,
    ) -> HuntDecision {
        HuntDecision {
            phase: self.state.phase,
            worthiness,
            confidence,
            conditions,
            reasoning,
        }
    }
}
