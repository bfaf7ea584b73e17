//! Bounded-latency "dream" simulation.
//!
//! Before a worthy moment is acted on, the engine may ask a [`DreamSimulator`]
//! to play the candidate effects forward and judge them. The simulation is
//! raced against a short deadline: whatever has not answered in time is
//! dropped, and the frame carries on without it.

use crate::error::{ControlError, Result};
use async_trait::async_trait;
use lumen_core::gatekeeper::{curate, vibe_arsenal};
use lumen_core::{clamp01, EffectKind, SpectralContext, Vibe};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Everything a simulator may look at.
#[derive(Debug, Clone, PartialEq)]
pub struct DreamRequest {
    pub vibe: Vibe,
    pub beauty: f32,
    pub consonance: f32,
    pub worthiness: f32,
    pub harshness: f32,
    pub drop_coming: bool,
    /// Effects under consideration, most preferred first
    pub candidates: Vec<EffectKind>,
    /// Confirmed firings, oldest first
    pub recent_effects: Vec<EffectKind>,
    pub spectral: SpectralContext,
    pub timestamp_ms: u64,
}

/// Simulator verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DreamVerdict {
    pub approved: bool,
    pub suggested_effect: Option<EffectKind>,
    /// Aesthetic and safety score in [0, 1], compared against the mood's
    /// ethics threshold before a cooldown may be bypassed
    pub ethical_score: f32,
    pub reasoning: String,
}

/// Plays candidate effects forward and judges them.
#[async_trait]
pub trait DreamSimulator: Send + Sync {
    async fn simulate(&self, request: DreamRequest) -> Result<DreamVerdict>;
}

/// How the race ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DreamOutcome {
    Completed(DreamVerdict),
    TimedOut,
    Failed(String),
}

impl DreamOutcome {
    /// The verdict, if the simulation finished in time
    pub fn verdict(&self) -> Option<&DreamVerdict> {
        match self {
            DreamOutcome::Completed(verdict) => Some(verdict),
            _ => None,
        }
    }

    /// Approved verdict, if any
    pub fn approved(&self) -> Option<&DreamVerdict> {
        self.verdict().filter(|v| v.approved)
    }
}

/// Race `simulator` against `deadline`. The losing future is dropped.
pub async fn simulate_with_deadline(
    simulator: &dyn DreamSimulator,
    request: DreamRequest,
    deadline: Duration,
) -> DreamOutcome {
    match tokio::time::timeout(deadline, simulator.simulate(request)).await {
        Ok(Ok(verdict)) => DreamOutcome::Completed(verdict),
        Ok(Err(e)) => {
            warn!("Dream simulation failed: {}", e);
            DreamOutcome::Failed(e.to_string())
        }
        Err(_) => {
            debug!("Dream simulation exceeded {}ms", deadline.as_millis());
            DreamOutcome::TimedOut
        }
    }
}

/// Approval floor of the scenario score.
const APPROVAL_THRESHOLD: f32 = 0.5;
/// Above this risk a scenario is never approved.
const MAX_RISK: f32 = 0.7;

/// Built-in simulator scoring each candidate as a scenario: projected beauty,
/// vibe coherence, diversity against recent firings, risk and confidence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioDreamSimulator;

/// One simulated candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scenario {
    effect: EffectKind,
    projected_beauty: f32,
    vibe_coherence: f32,
    diversity: f32,
    risk: f32,
    confidence: f32,
    score: f32,
}

impl ScenarioDreamSimulator {
    pub fn new() -> Self {
        Self
    }

    fn scenario(&self, effect: EffectKind, request: &DreamRequest) -> Scenario {
        let projected_beauty = clamp01(request.beauty * 0.6 + request.consonance * 0.4);
        let vibe_coherence = vibe_coherence(effect, request.vibe);
        let diversity = diversity(effect, &request.recent_effects);
        let risk = risk(effect, request);
        let confidence = if request.recent_effects.len() < 10 {
            0.7
        } else {
            1.0
        };

        let mut score = projected_beauty * 0.35
            + vibe_coherence * 0.25
            + diversity * 0.15
            + (1.0 - risk) * 0.15
            + confidence * 0.10;
        if request.drop_coming && request.worthiness > 0.7 {
            score += 0.1;
        }

        Scenario {
            effect,
            projected_beauty,
            vibe_coherence,
            diversity,
            risk,
            confidence,
            score: clamp01(score),
        }
    }
}

#[async_trait]
impl DreamSimulator for ScenarioDreamSimulator {
    async fn simulate(&self, request: DreamRequest) -> Result<DreamVerdict> {
        if request.candidates.is_empty() {
            return Err(ControlError::Simulation("no candidates to simulate".into()));
        }

        let best = request
            .candidates
            .iter()
            .map(|&effect| self.scenario(effect, &request))
            .fold(None::<Scenario>, |best, s| match best {
                Some(b) if b.score >= s.score => Some(b),
                _ => Some(s),
            });
        let Some(best) = best else {
            return Err(ControlError::Simulation("no scenario scored".into()));
        };

        let approved = best.score >= APPROVAL_THRESHOLD && best.risk <= MAX_RISK;
        let ethical_score = clamp01(best.score * 0.6 + (1.0 - best.risk) * 0.25 + best.diversity * 0.15);
        Ok(DreamVerdict {
            approved,
            suggested_effect: approved.then_some(best.effect),
            ethical_score,
            reasoning: format!(
                "{}: score={:.2} beauty={:.2} coherence={:.2} diversity={:.2} risk={:.2} conf={:.2}",
                best.effect,
                best.score,
                best.projected_beauty,
                best.vibe_coherence,
                best.diversity,
                best.risk,
                best.confidence
            ),
        })
    }
}

fn vibe_coherence(effect: EffectKind, vibe: Vibe) -> f32 {
    use EffectKind::*;
    match vibe {
        Vibe::TechnoClub => match effect {
            IndustrialStrobe | AcidSweep | CyberDualism | StrobeStorm => 1.0,
            SolarFlare => 0.0,
            _ => 0.5,
        },
        Vibe::FiestaLatina => match effect {
            SolarFlare | TropicalPulse | SalsaFire | CorazonLatino => 1.0,
            _ => 0.6,
        },
        Vibe::ChillLounge => match effect {
            GhostBreath | TidalWave | CumbiaMoon | WhaleSong | SolarCaustics => 1.0,
            _ => 0.5,
        },
        Vibe::PopRock | Vibe::Idle => {
            if vibe_arsenal(vibe).contains(&effect) {
                0.7
            } else {
                0.3
            }
        }
    }
}

fn diversity(effect: EffectKind, recent: &[EffectKind]) -> f32 {
    if recent.is_empty() {
        return 1.0;
    }
    let uses = recent.iter().filter(|&&e| e == effect).count();
    let usage_rate = uses as f32 / recent.len() as f32;
    (1.0 - usage_rate * 2.0).max(0.0)
}

fn risk(effect: EffectKind, request: &DreamRequest) -> f32 {
    let mut risk: f32 = 0.0;

    // Fatigue: heavy hitters dominating the recent history
    let heavy = request
        .recent_effects
        .iter()
        .filter(|e| is_heavy(**e))
        .count();
    if !request.recent_effects.is_empty() && is_heavy(effect) {
        let share = heavy as f32 / request.recent_effects.len() as f32;
        if share > 0.8 {
            risk += 0.4;
        } else if share > 0.6 {
            risk += 0.2;
        }
    }

    // Fired very recently
    if request.recent_effects.iter().rev().take(3).any(|&e| e == effect) {
        risk += 0.2;
    }

    if !curate(effect, &request.spectral).allowed {
        risk += 0.3;
    }

    if request.worthiness > 0.9 && is_heavy(effect) {
        risk += 0.1;
    }

    risk.min(1.0)
}

fn is_heavy(effect: EffectKind) -> bool {
    matches!(
        effect,
        EffectKind::SolarFlare
            | EffectKind::StrobeStorm
            | EffectKind::StrobeBurst
            | EffectKind::IndustrialStrobe
            | EffectKind::CoreMeltdown
            | EffectKind::GatlingRaid
    )
}
