//! Prediction engine: what comes next, and roughly when.
//!
//! Three sources are combined:
//! * a section-progression table matched against recent section changes,
//! * the short-term energy trend,
//! * a spectral buildup score (brightness and noise rising while the bass ducks).

use crate::sense::MusicalPattern;
use crate::types::SectionType;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

const MAX_SECTION_HISTORY: usize = 8;
const MAX_ENERGY_HISTORY: usize = 30;
const MAX_SPECTRAL_HISTORY: usize = 20;

const SPIKE_DELTA: f32 = 0.08;
const RISING_DELTA: f32 = 0.015;
const FALLING_DELTA: f32 = -0.02;
const MIN_ENERGY_FOR_RISING: f32 = 0.25;
const MIN_ENERGY_FOR_SPIKE: f32 = 0.60;
const TENSION_FOR_DROP: f32 = 0.4;

/// Kind of predicted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionKind {
    /// Drop coming
    DropIncoming,
    /// Buildup starting
    BuildupStarting,
    /// Breakdown coming
    BreakdownImminent,
    /// Section transition on the beat
    TransitionBeat,
    /// Energy shooting up
    EnergySpike,
    /// Energy falling away
    EnergyDrop,
}

impl fmt::Display for PredictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PredictionKind::DropIncoming => "drop_incoming",
            PredictionKind::BuildupStarting => "buildup_starting",
            PredictionKind::BreakdownImminent => "breakdown_imminent",
            PredictionKind::TransitionBeat => "transition_beat",
            PredictionKind::EnergySpike => "energy_spike",
            PredictionKind::EnergyDrop => "energy_drop",
        })
    }
}

/// Stage of a suggested action relative to the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStage {
    /// Before the event
    Prepare,
    /// On the event
    Execute,
    /// After the event
    Recover,
}

/// Lighting gesture of a suggested action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionGesture {
    /// Single flash
    Flash,
    /// Strobe
    Strobe,
    /// Pulse
    Pulse,
    /// Colour shift
    ColorShift,
    /// Intensity ramp
    IntensityRamp,
    /// Slow breathing
    Breathe,
}

/// Lighting action suggested for a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionAction {
    /// When
    pub stage: ActionStage,
    /// What
    pub gesture: ActionGesture,
    /// Intensity (0..1)
    pub intensity: f32,
    /// Duration
    pub duration_ms: u32,
    /// Offset from the event, negative is before
    pub offset_ms: i32,
}

const fn action(
    stage: ActionStage,
    gesture: ActionGesture,
    intensity: f32,
    duration_ms: u32,
    offset_ms: i32,
) -> PredictionAction {
    PredictionAction {
        stage,
        gesture,
        intensity,
        duration_ms,
        offset_ms,
    }
}

/// Forecast of the next musical event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicalPrediction {
    /// What
    pub kind: PredictionKind,
    /// Likely next section
    pub probable_section: Option<SectionType>,
    /// Probability (0..1)
    pub probability: f32,
    /// Time until the event
    pub estimated_time_ms: f32,
    /// Beats until the event
    pub estimated_beats: f32,
    /// Suggested lighting actions
    pub suggested_actions: Vec<PredictionAction>,
    /// Human-readable reasoning
    pub reasoning: String,
    /// Frame timestamp
    pub timestamp_ms: u64,
}

struct Progression {
    trigger: &'static [SectionType],
    next: SectionType,
    probability: f32,
    kind: PredictionKind,
    actions: &'static [PredictionAction],
}

use ActionGesture as G;
use ActionStage as S;

// Sorted longest trigger first. History only records section changes, so a
// trigger never repeats a section.
const PROGRESSIONS: [Progression; 7] = [
    Progression {
        trigger: &[SectionType::Verse, SectionType::Buildup],
        next: SectionType::Chorus,
        probability: 0.85,
        kind: PredictionKind::TransitionBeat,
        actions: &[
            action(S::Prepare, G::ColorShift, 0.5, 1000, -1000),
            action(S::Execute, G::Pulse, 0.8, 500, 0),
        ],
    },
    Progression {
        trigger: &[SectionType::Buildup],
        next: SectionType::Drop,
        probability: 0.75,
        kind: PredictionKind::DropIncoming,
        actions: &[
            action(S::Prepare, G::IntensityRamp, 0.6, 1500, -1500),
            action(S::Execute, G::Flash, 1.0, 150, 0),
        ],
    },
    Progression {
        trigger: &[SectionType::Drop],
        next: SectionType::Breakdown,
        probability: 0.75,
        kind: PredictionKind::BreakdownImminent,
        actions: &[
            action(S::Execute, G::IntensityRamp, 0.3, 2000, 0),
            action(S::Recover, G::Breathe, 0.4, 3000, 2000),
        ],
    },
    Progression {
        trigger: &[SectionType::Chorus],
        next: SectionType::Verse,
        probability: 0.70,
        kind: PredictionKind::TransitionBeat,
        actions: &[action(S::Prepare, G::Breathe, 0.6, 800, -800)],
    },
    Progression {
        trigger: &[SectionType::Breakdown],
        next: SectionType::Buildup,
        probability: 0.80,
        kind: PredictionKind::BuildupStarting,
        actions: &[
            action(S::Prepare, G::ColorShift, 0.4, 500, -500),
            action(S::Execute, G::IntensityRamp, 0.5, 2000, 0),
        ],
    },
    Progression {
        trigger: &[SectionType::Intro],
        next: SectionType::Verse,
        probability: 0.85,
        kind: PredictionKind::TransitionBeat,
        actions: &[action(S::Execute, G::Pulse, 0.6, 300, 0)],
    },
    Progression {
        trigger: &[SectionType::Verse],
        next: SectionType::Buildup,
        probability: 0.65,
        kind: PredictionKind::BuildupStarting,
        actions: &[action(S::Prepare, G::IntensityRamp, 0.4, 1000, -1000)],
    },
];

/// One section change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionHistoryEntry {
    /// Section entered
    pub section: SectionType,
    /// When it was entered
    pub timestamp_ms: u64,
    /// How long it lasted, 0 while current
    pub duration_ms: u64,
    /// Rhythmic intensity on entry
    pub energy_level: f32,
}

/// Short-term energy trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyTrend {
    /// Sharp rise
    Spike,
    /// Gentle rise
    Rising,
    /// Flat
    Stable,
    /// Falling
    Falling,
}

/// Stateful predictor; one per session.
#[derive(Debug, Default)]
pub struct PredictionEngine {
    section_history: VecDeque<SectionHistoryEntry>,
    energy_history: VecDeque<f32>,
    last_prediction: Option<MusicalPrediction>,
}

impl PredictionEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Predict from the section progression.
    pub fn predict_from_section(&mut self, pattern: &MusicalPattern) -> Option<MusicalPrediction> {
        self.update_section_history(pattern);

        let Some(progression) = PROGRESSIONS.iter().find(|p| self.matches(p.trigger)) else {
            self.last_prediction = None;
            return None;
        };

        let beats = match progression.kind {
            PredictionKind::DropIncoming if pattern.is_building => 4.0,
            PredictionKind::DropIncoming => 8.0,
            PredictionKind::BreakdownImminent => 8.0,
            PredictionKind::BuildupStarting | PredictionKind::TransitionBeat => 4.0,
            PredictionKind::EnergySpike | PredictionKind::EnergyDrop => 8.0,
        };

        let mut probability = progression.probability;
        if pattern.is_building {
            probability *= 1.1;
        }
        if pattern.emotional_tension > 0.7 {
            probability *= 1.05;
        }
        if pattern.syncopation > 0.7 {
            probability *= 0.95;
        }

        let trigger = progression
            .trigger
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" -> ");
        let mut reasoning = format!(
            "Pattern [{}] -> {} ({:.0}%)",
            trigger,
            progression.next.as_str(),
            progression.probability * 100.0
        );
        if pattern.is_building {
            reasoning.push_str(", energy rising");
        }
        if pattern.emotional_tension > 0.7 {
            reasoning.push_str(", high tension");
        }

        let prediction = MusicalPrediction {
            kind: progression.kind,
            probable_section: Some(progression.next),
            probability: probability.clamp(0.0, 1.0),
            estimated_time_ms: beats * ms_per_beat(pattern.bpm),
            estimated_beats: beats,
            suggested_actions: progression.actions.to_vec(),
            reasoning,
            timestamp_ms: pattern.timestamp_ms,
        };
        self.last_prediction = Some(prediction.clone());
        Some(prediction)
    }

    /// Predict from the raw energy trend.
    pub fn predict_from_energy(
        &mut self,
        pattern: &MusicalPattern,
        energy: f32,
    ) -> Option<MusicalPrediction> {
        self.energy_history.push_back(energy);
        while self.energy_history.len() > MAX_ENERGY_HISTORY {
            self.energy_history.pop_front();
        }

        let trend = self.energy_trend();
        let velocity = self.energy_velocity();
        let bpm = pattern.bpm;
        let ts = pattern.timestamp_ms;

        if trend == EnergyTrend::Spike && energy >= MIN_ENERGY_FOR_SPIKE {
            let frames_until_peak = if velocity > 0.0 {
                ((1.0 - energy) / velocity).ceil()
            } else {
                60.0
            };
            let beats = ((frames_until_peak / 60.0) * (bpm / 60.0)).round().max(2.0);
            return Some(MusicalPrediction {
                kind: PredictionKind::EnergySpike,
                probable_section: Some(SectionType::Drop),
                probability: (0.75 + velocity * 2.0).clamp(0.0, 1.0),
                estimated_time_ms: beats * ms_per_beat(bpm),
                estimated_beats: beats,
                suggested_actions: vec![
                    action(S::Prepare, G::IntensityRamp, 0.8, 1500, -1500),
                    action(S::Execute, G::Flash, 1.0, 200, 0),
                ],
                reasoning: format!(
                    "Energy spike: +{:.1}%/frame, peak in ~{} beats",
                    velocity * 100.0,
                    beats
                ),
                timestamp_ms: ts,
            });
        }

        if trend == EnergyTrend::Rising && energy > MIN_ENERGY_FOR_RISING {
            let beats = (8.0 - energy * 4.0).round();
            return Some(MusicalPrediction {
                kind: PredictionKind::BuildupStarting,
                probable_section: Some(SectionType::Buildup),
                probability: 0.55 + energy * 0.2,
                estimated_time_ms: beats * ms_per_beat(bpm),
                estimated_beats: beats,
                suggested_actions: vec![action(S::Prepare, G::IntensityRamp, 0.5, 2000, -2000)],
                reasoning: format!("Rising energy: {:.0}% and climbing", energy * 100.0),
                timestamp_ms: ts,
            });
        }

        if trend == EnergyTrend::Rising {
            return Some(MusicalPrediction {
                kind: PredictionKind::BuildupStarting,
                probable_section: None,
                probability: 0.35 + energy * 0.15,
                estimated_time_ms: 8000.0,
                estimated_beats: 8.0,
                suggested_actions: Vec::new(),
                reasoning: format!("Energy building: {:.0}%", energy * 100.0),
                timestamp_ms: ts,
            });
        }

        let tension = pattern.emotional_tension;
        if tension > TENSION_FOR_DROP && trend == EnergyTrend::Falling {
            return Some(MusicalPrediction {
                kind: PredictionKind::DropIncoming,
                probable_section: Some(SectionType::Drop),
                probability: (0.60 + tension * 0.2).min(1.0),
                estimated_time_ms: 4000.0,
                estimated_beats: 4.0,
                suggested_actions: vec![
                    action(S::Prepare, G::IntensityRamp, 0.7, 2000, -2000),
                    action(S::Execute, G::Flash, 1.0, 150, 0),
                ],
                reasoning: format!(
                    "Drop incoming: tension {:.0}% with energy falling",
                    tension * 100.0
                ),
                timestamp_ms: ts,
            });
        }

        if trend == EnergyTrend::Falling && energy < 0.5 {
            return Some(MusicalPrediction {
                kind: PredictionKind::EnergyDrop,
                probable_section: Some(SectionType::Breakdown),
                probability: 0.50,
                estimated_time_ms: 4000.0,
                estimated_beats: 8.0,
                suggested_actions: vec![action(S::Recover, G::Breathe, 0.4, 3000, 0)],
                reasoning: format!("Falling energy: {:.0}%, recovery mode", energy * 100.0),
                timestamp_ms: ts,
            });
        }

        None
    }

    /// Section and energy predictions combined with the spectral buildup score.
    pub fn predict_combined(
        &mut self,
        pattern: &MusicalPattern,
        energy: f32,
        spectral_buildup: f32,
    ) -> Option<MusicalPrediction> {
        let by_section = self.predict_from_section(pattern);
        let by_energy = self.predict_from_energy(pattern, energy);

        let mut best = match (by_section, by_energy) {
            (Some(s), Some(e)) => Some(if e.probability > s.probability { e } else { s }),
            (s, e) => s.or(e),
        };

        if spectral_buildup > 0.4 {
            let boosts = best.as_ref().is_some_and(|p| {
                matches!(
                    p.kind,
                    PredictionKind::BuildupStarting
                        | PredictionKind::DropIncoming
                        | PredictionKind::EnergySpike
                )
            });
            if boosts {
                if let Some(prediction) = best.as_mut() {
                    let boost = (spectral_buildup - 0.4) * 0.5;
                    prediction.probability = (prediction.probability + boost).min(0.95);
                    prediction.reasoning = format!(
                        "{} | spectral buildup {:.0}%",
                        prediction.reasoning,
                        spectral_buildup * 100.0
                    );
                }
            } else if spectral_buildup > 0.6 {
                let beats = 4.0 + (1.0 - spectral_buildup) * 4.0;
                best = Some(MusicalPrediction {
                    kind: PredictionKind::BuildupStarting,
                    probable_section: Some(SectionType::Buildup),
                    probability: spectral_buildup * 0.85,
                    estimated_time_ms: beats * ms_per_beat(pattern.bpm),
                    estimated_beats: beats,
                    suggested_actions: vec![
                        action(S::Prepare, G::IntensityRamp, 0.6, 2000, -2000),
                        action(S::Execute, G::Strobe, 0.9, 500, 0),
                    ],
                    reasoning: format!(
                        "Spectral buildup detected ({:.0}%)",
                        spectral_buildup * 100.0
                    ),
                    timestamp_ms: pattern.timestamp_ms,
                });
            }
        }

        best
    }

    /// Last section-based prediction
    pub fn last_prediction(&self) -> Option<&MusicalPrediction> {
        self.last_prediction.as_ref()
    }

    /// Recorded section changes, oldest first
    pub fn section_history(&self) -> &VecDeque<SectionHistoryEntry> {
        &self.section_history
    }

    /// Whether `prediction` named the section that actually followed
    pub fn validate_prediction(prediction: &MusicalPrediction, actual: SectionType) -> bool {
        prediction.probable_section == Some(actual)
    }

    /// Energy trend over the last 20 samples
    pub fn energy_trend(&self) -> EnergyTrend {
        let n = self.energy_history.len();
        if n < 10 {
            return EnergyTrend::Stable;
        }
        let older: Vec<f32> = self
            .energy_history
            .range(n.saturating_sub(20)..n - 10)
            .copied()
            .collect();
        if older.len() < 5 {
            return EnergyTrend::Stable;
        }
        let recent_avg = self.energy_history.iter().skip(n - 10).sum::<f32>() / 10.0;
        let older_avg = older.iter().sum::<f32>() / older.len() as f32;
        let delta = recent_avg - older_avg;

        if delta > SPIKE_DELTA {
            EnergyTrend::Spike
        } else if delta > RISING_DELTA {
            EnergyTrend::Rising
        } else if delta < FALLING_DELTA {
            EnergyTrend::Falling
        } else {
            EnergyTrend::Stable
        }
    }

    /// Mean per-frame change over the last 5 samples
    pub fn energy_velocity(&self) -> f32 {
        let n = self.energy_history.len();
        if n < 5 {
            return 0.0;
        }
        let recent: Vec<f32> = self.energy_history.iter().skip(n - 5).copied().collect();
        recent.windows(2).map(|w| w[1] - w[0]).sum::<f32>() / 4.0
    }

    /// Forget everything (new song)
    pub fn reset(&mut self) {
        self.section_history.clear();
        self.energy_history.clear();
        self.last_prediction = None;
    }

    fn update_section_history(&mut self, pattern: &MusicalPattern) {
        let changed = self
            .section_history
            .back()
            .map_or(true, |last| last.section != pattern.section);
        if !changed {
            return;
        }
        if let Some(last) = self.section_history.back_mut() {
            last.duration_ms = pattern.timestamp_ms.saturating_sub(last.timestamp_ms);
        }
        self.section_history.push_back(SectionHistoryEntry {
            section: pattern.section,
            timestamp_ms: pattern.timestamp_ms,
            duration_ms: 0,
            energy_level: pattern.rhythmic_intensity,
        });
        while self.section_history.len() > MAX_SECTION_HISTORY {
            self.section_history.pop_front();
        }
    }

    fn matches(&self, trigger: &[SectionType]) -> bool {
        let n = self.section_history.len();
        if trigger.len() > n {
            return false;
        }
        self.section_history
            .iter()
            .skip(n - trigger.len())
            .zip(trigger)
            .all(|(entry, section)| entry.section == *section)
    }
}

fn ms_per_beat(bpm: f32) -> f32 {
    if bpm > 0.0 {
        60_000.0 / bpm
    } else {
        500.0
    }
}

/// Rolling spectral buildup score: brightness up, noise up, bass ducking.
#[derive(Debug, Default)]
pub struct SpectralBuildupDetector {
    centroid: VecDeque<f32>,
    flatness: VecDeque<f32>,
    bass: VecDeque<f32>,
}

impl SpectralBuildupDetector {
    /// Create an empty detector
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one frame and return the score in `[0, 1]`.
    pub fn update(&mut self, centroid: f32, flatness: f32, bass: f32) -> f32 {
        for (history, value) in [
            (&mut self.centroid, centroid),
            (&mut self.flatness, flatness),
            (&mut self.bass, bass),
        ] {
            history.push_back(value);
            while history.len() > MAX_SPECTRAL_HISTORY {
                history.pop_front();
            }
        }
        self.score()
    }

    /// Score of the current history
    pub fn score(&self) -> f32 {
        let len = self.centroid.len();
        if len < 5 {
            return 0.0;
        }
        let (c1, c2) = halves(&self.centroid);
        let (f1, f2) = halves(&self.flatness);
        let (b1, b2) = halves(&self.bass);

        let mut score = 0.0f32;
        if c2 > c1 * 1.1 {
            score += ((c2 - c1) / (c1 + 0.01) * 0.5).min(0.35);
        }
        if f2 > f1 + 0.05 {
            score += ((f2 - f1) * 3.5).min(0.35);
        }
        if b2 < b1 * 0.85 {
            score += ((b1 - b2) / (b1 + 0.01) * 0.5).min(0.30);
        }
        score.min(1.0)
    }

    /// Forget the history
    pub fn reset(&mut self) {
        self.centroid.clear();
        self.flatness.clear();
        self.bass.clear();
    }
}

fn halves(values: &VecDeque<f32>) -> (f32, f32) {
    let len = values.len();
    let half = len / 2;
    let first = values.iter().take(half).sum::<f32>() / half as f32;
    let second = values.iter().skip(half).sum::<f32>() / (len - half) as f32;
    (first, second)
}
