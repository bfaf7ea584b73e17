//! Fuzzy decision maker.
//!
//! Crisp inputs are fuzzified into membership grades, a fixed rule base votes
//! for one of four outputs (max aggregation), and defuzzification picks a single
//! action by strict priority.

use crate::types::{clamp01, SectionType};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const LOG_INTERVAL: u64 = 60;

/// Low / medium / high membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FuzzySet {
    /// Membership of "low"
    pub low: f32,
    /// Membership of "medium"
    pub medium: f32,
    /// Membership of "high"
    pub high: f32,
}

/// Z-score membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZScoreSet {
    /// |z| well inside the usual range
    pub normal: f32,
    /// Around 1.5σ to 2.5σ
    pub notable: f32,
    /// 2.5σ and beyond
    pub epic: f32,
}

/// Narrative energy of a section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionSet {
    /// Intro, outro, breakdown
    pub quiet: f32,
    /// Verse, buildup
    pub building: f32,
    /// Chorus, drop
    pub peak: f32,
}

impl SectionSet {
    /// Fixed per-section profile
    pub fn for_section(section: SectionType) -> Self {
        let (quiet, building, peak) = match section {
            SectionType::Intro => (1.0, 0.2, 0.0),
            SectionType::Verse => (0.3, 0.7, 0.1),
            SectionType::Chorus => (0.0, 0.2, 1.0),
            SectionType::Bridge => (0.4, 0.6, 0.2),
            SectionType::Buildup => (0.0, 1.0, 0.3),
            SectionType::Drop => (0.0, 0.0, 1.0),
            SectionType::Breakdown => (0.8, 0.2, 0.0),
            SectionType::Outro => (1.0, 0.1, 0.0),
        };
        Self {
            quiet,
            building,
            peak,
        }
    }
}

/// Crisp inputs of the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzyInput {
    /// Energy (0..1)
    pub energy: f32,
    /// Energy z-score, typically -4..4
    pub z_score: f32,
    /// Current section
    pub section: SectionType,
    /// Spectral harshness (0..1)
    pub harshness: f32,
    /// Hunt worthiness (0..1), used crisp
    pub hunt_score: f32,
    /// Beauty (0..1), used crisp
    pub beauty: f32,
}

/// Fuzzified inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzyInputs {
    /// Energy sets
    pub energy: FuzzySet,
    /// Z-score sets
    pub z_score: ZScoreSet,
    /// Section profile
    pub section: SectionSet,
    /// Harshness sets
    pub harshness: FuzzySet,
    /// Crisp hunt score
    pub hunt_score: f32,
    /// Crisp beauty
    pub beauty: f32,
}

/// Rule-base outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuzzyAction {
    /// Divine override
    ForceStrike,
    /// Optimal moment
    Strike,
    /// Something is coming
    Prepare,
    /// Keep state
    Hold,
}

impl FuzzyAction {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            FuzzyAction::ForceStrike => "force_strike",
            FuzzyAction::Strike => "strike",
            FuzzyAction::Prepare => "prepare",
            FuzzyAction::Hold => "hold",
        }
    }

    /// Intensity range of the action
    pub fn intensity_range(&self) -> (f32, f32) {
        match self {
            FuzzyAction::ForceStrike => (0.85, 1.0),
            FuzzyAction::Strike => (0.6, 0.95),
            FuzzyAction::Prepare => (0.3, 0.6),
            FuzzyAction::Hold => (0.0, 0.3),
        }
    }
}

impl fmt::Display for FuzzyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated activation of each output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FuzzyScores {
    /// FORCE_STRIKE activation
    pub force_strike: f32,
    /// STRIKE activation
    pub strike: f32,
    /// PREPARE activation
    pub prepare: f32,
    /// HOLD activation
    pub hold: f32,
}

impl FuzzyScores {
    /// Score of one output
    pub fn get(&self, action: FuzzyAction) -> f32 {
        match action {
            FuzzyAction::ForceStrike => self.force_strike,
            FuzzyAction::Strike => self.strike,
            FuzzyAction::Prepare => self.prepare,
            FuzzyAction::Hold => self.hold,
        }
    }

    fn slot(&mut self, action: FuzzyAction) -> &mut f32 {
        match action {
            FuzzyAction::ForceStrike => &mut self.force_strike,
            FuzzyAction::Strike => &mut self.strike,
            FuzzyAction::Prepare => &mut self.prepare,
            FuzzyAction::Hold => &mut self.hold,
        }
    }
}

/// One rule activation above the noise floor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleActivation {
    /// Rule name
    pub rule: &'static str,
    /// Weighted activation
    pub activation: f32,
    /// Output it votes for
    pub output: FuzzyAction,
}

/// Defuzzified decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyDecision {
    /// Chosen action
    pub action: FuzzyAction,
    /// Intensity within the action's range
    pub intensity: f32,
    /// Clarity of the win
    pub confidence: f32,
    /// Aggregated scores
    pub scores: FuzzyScores,
    /// Strongest rule voting for the chosen action
    pub dominant_rule: &'static str,
    /// Activations sorted strongest first
    pub activations: Vec<RuleActivation>,
    /// Human-readable reasoning
    pub reasoning: String,
}

struct FuzzyRule {
    name: &'static str,
    antecedent: fn(&FuzzyInputs) -> f32,
    consequent: FuzzyAction,
    weight: f32,
}

const RULES: [FuzzyRule; 17] = [
    // Force strike
    FuzzyRule {
        name: "Divine_Drop",
        antecedent: |i| i.energy.high.min(i.z_score.epic).min(i.section.peak),
        consequent: FuzzyAction::ForceStrike,
        weight: 1.0,
    },
    FuzzyRule {
        name: "Epic_Peak",
        antecedent: |i| i.z_score.epic.min(i.section.peak) * 0.9,
        consequent: FuzzyAction::ForceStrike,
        weight: 0.95,
    },
    FuzzyRule {
        name: "Epic_Hunt",
        antecedent: |i| i.z_score.epic * i.hunt_score * i.energy.high,
        consequent: FuzzyAction::ForceStrike,
        weight: 0.90,
    },
    // Strike
    FuzzyRule {
        name: "Hunt_Strike",
        antecedent: |i| i.energy.high.min(i.hunt_score).min(i.section.peak),
        consequent: FuzzyAction::Strike,
        weight: 0.85,
    },
    FuzzyRule {
        name: "Harsh_Climax",
        antecedent: |i| i.energy.high.min(i.harshness.high).min(i.section.peak),
        consequent: FuzzyAction::Strike,
        weight: 0.80,
    },
    FuzzyRule {
        name: "Notable_Peak",
        antecedent: |i| i.z_score.notable.min(i.section.peak),
        consequent: FuzzyAction::Strike,
        weight: 0.75,
    },
    FuzzyRule {
        name: "High_Energy_Hunt",
        antecedent: |i| i.energy.high * i.hunt_score * 0.9,
        consequent: FuzzyAction::Strike,
        weight: 0.70,
    },
    FuzzyRule {
        name: "Beautiful_Peak",
        antecedent: |i| i.section.peak.min(i.beauty * 0.8),
        consequent: FuzzyAction::Strike,
        weight: 0.65,
    },
    // Prepare
    FuzzyRule {
        name: "Building_Tension",
        antecedent: |i| i.energy.medium.min(i.section.building),
        consequent: FuzzyAction::Prepare,
        weight: 0.60,
    },
    FuzzyRule {
        name: "Notable_Building",
        antecedent: |i| i.z_score.notable.min(i.section.building),
        consequent: FuzzyAction::Prepare,
        weight: 0.55,
    },
    FuzzyRule {
        name: "Harshness_Rising",
        antecedent: |i| i.harshness.high.min(i.section.building),
        consequent: FuzzyAction::Prepare,
        weight: 0.50,
    },
    FuzzyRule {
        name: "Energy_Rising",
        antecedent: |i| i.energy.medium * (1.0 - i.section.quiet) * 0.7,
        consequent: FuzzyAction::Prepare,
        weight: 0.45,
    },
    FuzzyRule {
        name: "Hunt_Preparing",
        antecedent: |i| i.hunt_score * i.section.building * 0.8,
        consequent: FuzzyAction::Prepare,
        weight: 0.50,
    },
    // Hold
    FuzzyRule {
        name: "Quiet_Section",
        antecedent: |i| i.energy.low.min(i.section.quiet),
        consequent: FuzzyAction::Hold,
        weight: 1.0,
    },
    FuzzyRule {
        name: "Normal_State",
        antecedent: |i| i.z_score.normal * (1.0 - i.hunt_score) * i.section.quiet,
        consequent: FuzzyAction::Hold,
        weight: 0.85,
    },
    FuzzyRule {
        name: "Low_Energy",
        antecedent: |i| i.energy.low * (1.0 - i.section.peak),
        consequent: FuzzyAction::Hold,
        weight: 0.70,
    },
    FuzzyRule {
        name: "No_Hunt_Interest",
        antecedent: |i| (1.0 - i.hunt_score) * i.energy.low,
        consequent: FuzzyAction::Hold,
        weight: 0.60,
    },
];

/// Peak of 1 at `center`, falling to 0 at `center ± spread`.
pub fn triangular(value: f32, center: f32, spread: f32) -> f32 {
    let distance = (value - center).abs();
    if distance >= spread {
        0.0
    } else {
        1.0 - distance / spread
    }
}

/// 1 up to `edge - spread`, 0 from `edge`.
pub fn left_trapezoid(value: f32, edge: f32, spread: f32) -> f32 {
    if value <= edge - spread {
        1.0
    } else if value >= edge {
        0.0
    } else {
        (edge - value) / spread
    }
}

/// 0 up to `edge`, 1 from `edge + spread`.
pub fn right_trapezoid(value: f32, edge: f32, spread: f32) -> f32 {
    if value >= edge + spread {
        1.0
    } else if value <= edge {
        0.0
    } else {
        (value - edge) / spread
    }
}

fn level_set(value: f32) -> FuzzySet {
    FuzzySet {
        low: left_trapezoid(value, 0.3, 0.3),
        medium: triangular(value, 0.5, 0.35),
        high: right_trapezoid(value, 0.65, 0.35),
    }
}

/// Z-score membership with breakpoints at 1.5σ and 2.5σ.
pub fn z_score_set(z: f32) -> ZScoreSet {
    let abs = z.abs();
    let normal = if abs < 1.5 {
        1.0 - (abs / 1.5) * 0.5
    } else {
        (1.0 - (abs - 1.0)).max(0.0)
    };
    let notable = if abs < 1.5 {
        abs / 2.5
    } else if abs >= 2.5 {
        (1.0 - (abs - 2.5)).max(0.0)
    } else {
        1.0
    };
    let epic = if abs < 2.5 {
        (abs - 1.5).max(0.0)
    } else {
        (0.5 + (abs - 2.5) * 0.25).min(1.0)
    };
    ZScoreSet {
        normal,
        notable,
        epic,
    }
}

/// Map crisp inputs to membership grades.
pub fn fuzzify(input: &FuzzyInput) -> FuzzyInputs {
    FuzzyInputs {
        energy: level_set(input.energy),
        z_score: z_score_set(input.z_score),
        section: SectionSet::for_section(input.section),
        harshness: level_set(input.harshness),
        hunt_score: input.hunt_score,
        beauty: input.beauty,
    }
}

/// Evaluate every rule; per-output MAX aggregation.
pub fn evaluate_rules(inputs: &FuzzyInputs) -> (FuzzyScores, Vec<RuleActivation>) {
    let mut scores = FuzzyScores::default();
    let mut activations = Vec::new();

    for rule in &RULES {
        let activation = clamp01((rule.antecedent)(inputs) * rule.weight);
        if activation > 0.01 {
            activations.push(RuleActivation {
                rule: rule.name,
                activation,
                output: rule.consequent,
            });
        }
        let slot = scores.slot(rule.consequent);
        *slot = slot.max(activation);
    }

    activations.sort_by(|a, b| b.activation.total_cmp(&a.activation));
    (scores, activations)
}

/// Strict-priority action selection. Total over every score vector.
pub fn select_action(scores: &FuzzyScores) -> FuzzyAction {
    if scores.force_strike > 0.5 {
        FuzzyAction::ForceStrike
    } else if scores.strike > scores.hold + 0.15 && scores.strike > 0.3 {
        FuzzyAction::Strike
    } else if scores.prepare > scores.hold && scores.prepare > 0.25 {
        FuzzyAction::Prepare
    } else {
        FuzzyAction::Hold
    }
}

/// (max + gap to the second-highest) / 2
pub fn confidence(scores: &FuzzyScores) -> f32 {
    let mut values = [
        scores.force_strike,
        scores.strike,
        scores.prepare,
        scores.hold,
    ];
    values.sort_by(|a, b| b.total_cmp(a));
    let (max, second) = (values[0], values[1]);
    (max + (max - second)) / 2.0
}

/// Turn aggregated scores into a decision.
pub fn defuzzify(scores: FuzzyScores, activations: Vec<RuleActivation>) -> FuzzyDecision {
    let action = select_action(&scores);
    let dominant_rule = activations
        .iter()
        .find(|a| a.output == action)
        .map(|a| a.rule)
        .unwrap_or(match action {
            FuzzyAction::ForceStrike => "Divine_Override",
            FuzzyAction::Strike => "Strike_Rule",
            FuzzyAction::Prepare => "Prepare_Rule",
            FuzzyAction::Hold => "Default_Hold",
        });

    let (min, max) = action.intensity_range();
    let intensity = min + scores.get(action) * (max - min);

    let top = activations
        .iter()
        .take(3)
        .map(|a| format!("{}({:.2})", a.rule, a.activation))
        .collect::<Vec<_>>()
        .join(", ");
    let reasoning = format!(
        "{} via [{}] | Scores: F={:.2} S={:.2} P={:.2} H={:.2} | Top: {}",
        action.as_str().to_uppercase(),
        dominant_rule,
        scores.force_strike,
        scores.strike,
        scores.prepare,
        scores.hold,
        top
    );

    FuzzyDecision {
        action,
        intensity,
        confidence: confidence(&scores),
        scores,
        dominant_rule,
        activations,
        reasoning,
    }
}

/// Fuzzify, evaluate, defuzzify.
pub fn fuzzy_evaluate(input: &FuzzyInput) -> FuzzyDecision {
    let inputs = fuzzify(input);
    let (scores, activations) = evaluate_rules(&inputs);
    defuzzify(scores, activations)
}

/// Name, output and weight of every rule
pub fn rule_table() -> Vec<(&'static str, FuzzyAction, f32)> {
    RULES
        .iter()
        .map(|r| (r.name, r.consequent, r.weight))
        .collect()
}

/// Stateful wrapper remembering the last decision.
#[derive(Debug, Default)]
pub struct FuzzyDecisionMaker {
    last_decision: Option<FuzzyDecision>,
    frame_count: u64,
}

impl FuzzyDecisionMaker {
    /// Create a new decision maker
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one frame.
    pub fn evaluate(&mut self, input: &FuzzyInput) -> FuzzyDecision {
        let decision = fuzzy_evaluate(input);
        self.frame_count += 1;
        if self.frame_count % LOG_INTERVAL == 0 {
            debug!(
                "Fuzzy {} | E={:.2} Z={:.1}σ | conf={:.2} int={:.2} | {}",
                decision.action,
                input.energy,
                input.z_score,
                decision.confidence,
                decision.intensity,
                decision.dominant_rule
            );
        }
        self.last_decision = Some(decision.clone());
        decision
    }

    /// Last decision, if any
    pub fn last_decision(&self) -> Option<&FuzzyDecision> {
        self.last_decision.as_ref()
    }

    /// Frames evaluated since reset
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Forget the last decision
    pub fn reset(&mut self) {
        self.last_decision = None;
        self.frame_count = 0;
    }
}
