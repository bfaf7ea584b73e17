//! Musical pattern sensor: turns a feature snapshot into a musical read-out.

use crate::frame::AudioFrame;
use crate::types::{clamp01, SectionType, Vibe};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::trace;

const MAX_HISTORY: usize = 30;

/// Coarse energy phase of the smoothed energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnergyPhase {
    /// Below 0.55
    #[default]
    Valley,
    /// 0.55..0.75
    Building,
    /// 0.75..0.85
    Peak,
    /// 0.85 and above
    Drop,
}

impl EnergyPhase {
    fn classify(energy: f32) -> Self {
        if energy >= 0.85 {
            EnergyPhase::Drop
        } else if energy >= 0.75 {
            EnergyPhase::Peak
        } else if energy >= 0.55 {
            EnergyPhase::Building
        } else {
            EnergyPhase::Valley
        }
    }
}

/// Per-frame musical read-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicalPattern {
    /// Active vibe
    pub vibe: Vibe,
    /// Normalised section
    pub section: SectionType,
    /// Coarse energy phase
    pub energy_phase: EnergyPhase,
    /// Tempo
    pub bpm: f32,
    /// Beat phase (0..1)
    pub beat_phase: f32,
    /// Syncopation
    pub syncopation: f32,
    /// Bass/syncopation driven intensity
    pub rhythmic_intensity: f32,
    /// Build-up of tension from energy trend, section changes and beat jitter
    pub emotional_tension: f32,
    /// Energy rising over the last frames
    pub is_building: bool,
    /// Energy falling over the last frames
    pub is_releasing: bool,
    /// Spread of energy across bands
    pub harmonic_density: f32,
    /// Bass band
    pub bass_presence: f32,
    /// Mid band
    pub mid_presence: f32,
    /// High band
    pub high_presence: f32,
    /// Spectral harshness
    pub harshness: f32,
    /// Spectral flatness
    pub spectral_flatness: f32,
    /// Spectral centroid in Hz
    pub spectral_centroid: f32,
    /// Raw energy
    pub raw_energy: f32,
    /// Smoothed energy
    pub smoothed_energy: f32,
    /// Energy z-score from contextual memory (filled in by the orchestrator)
    pub energy_z_score: f32,
    /// Upstream drop flag
    pub is_drop_active: bool,
    /// 0 at drop energy, 1 at silence
    pub distance_from_drop: f32,
    /// Frame timestamp
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    energy: f32,
    section: SectionType,
    beat_phase: f32,
}

#[derive(Debug, Clone, Copy)]
struct RecentChanges {
    energy_trend: f32,
    section_changed: bool,
    beat_stability: f32,
}

/// Stateful pattern sensor (keeps ~0.5s of history).
#[derive(Debug, Default)]
pub struct PatternSensor {
    history: VecDeque<HistoryEntry>,
}

impl PatternSensor {
    /// Create a new sensor
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the musical pattern of one frame.
    pub fn sense(&mut self, frame: &AudioFrame, vibe: Vibe) -> MusicalPattern {
        let section = frame.section();
        let energy_phase = EnergyPhase::classify(frame.smoothed_energy);

        self.history.push_back(HistoryEntry {
            energy: frame.smoothed_energy,
            section,
            beat_phase: frame.beat_phase,
        });
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }

        let changes = self.recent_changes();
        let rhythmic_intensity = clamp01(frame.bass * 0.6 + frame.syncopation * 0.4);
        let emotional_tension = emotional_tension(frame, &changes);
        let harmonic_density = harmonic_density(frame);

        trace!(
            "pattern: section={} phase={:?} rhythm={:.2} tension={:.2}",
            section,
            energy_phase,
            rhythmic_intensity,
            emotional_tension
        );

        MusicalPattern {
            vibe,
            section,
            energy_phase,
            bpm: frame.bpm,
            beat_phase: frame.beat_phase,
            syncopation: frame.syncopation,
            rhythmic_intensity,
            emotional_tension,
            is_building: changes.energy_trend > 0.05,
            is_releasing: changes.energy_trend < -0.05,
            harmonic_density,
            bass_presence: frame.bass,
            mid_presence: frame.mid,
            high_presence: frame.high,
            harshness: frame.harshness,
            spectral_flatness: frame.spectral_flatness,
            spectral_centroid: frame.spectral_centroid,
            raw_energy: frame.raw_energy,
            smoothed_energy: frame.smoothed_energy,
            energy_z_score: 0.0,
            is_drop_active: frame.is_drop_active,
            distance_from_drop: distance_from_drop(frame.smoothed_energy),
            timestamp_ms: frame.timestamp_ms,
        }
    }

    /// Whether the section of `frame` differs from the last sensed one.
    pub fn section_changed(&self, frame: &AudioFrame) -> bool {
        if self.history.len() < 2 {
            return false;
        }
        self.history
            .back()
            .is_some_and(|last| last.section != frame.section())
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.history.clear();
    }

    fn recent_changes(&self) -> RecentChanges {
        if self.history.len() < 5 {
            return RecentChanges {
                energy_trend: 0.0,
                section_changed: false,
                beat_stability: 1.0,
            };
        }

        let skip = self.history.len().saturating_sub(10);
        let recent: Vec<&HistoryEntry> = self.history.iter().skip(skip).collect();
        let first = recent.first().map(|e| e.energy).unwrap_or(0.0);
        let last = recent.last().map(|e| e.energy).unwrap_or(0.0);

        let tail = self.history.len() - 5;
        let mut sections = self.history.iter().skip(tail).map(|e| e.section);
        let head = sections.next();
        let section_changed = sections.any(|s| Some(s) != head);

        let n = recent.len() as f32;
        let avg_phase = recent.iter().map(|e| e.beat_phase).sum::<f32>() / n;
        let variance = recent
            .iter()
            .map(|e| (e.beat_phase - avg_phase).powi(2))
            .sum::<f32>()
            / n;

        RecentChanges {
            energy_trend: last - first,
            section_changed,
            beat_stability: (1.0 - variance * 4.0).max(0.0),
        }
    }
}

/// Urgency of the moment as a single number, used by decision heuristics.
pub fn moment_urgency(pattern: &MusicalPattern) -> f32 {
    if pattern.is_drop_active {
        return 1.0;
    }
    if pattern.is_building && pattern.energy_phase == EnergyPhase::Peak {
        return 0.85;
    }
    match pattern.section {
        SectionType::Chorus => 0.7,
        SectionType::Buildup => 0.6,
        SectionType::Verse | SectionType::Breakdown => 0.3,
        _ => 0.5,
    }
}

fn emotional_tension(frame: &AudioFrame, changes: &RecentChanges) -> f32 {
    let mut tension = frame.smoothed_energy * 0.4;
    if changes.energy_trend > 0.0 {
        tension += changes.energy_trend * 2.0;
    }
    if changes.section_changed {
        tension += 0.2;
    }
    tension += (1.0 - changes.beat_stability) * 0.15;
    // Bright top end with no bass reads as suspense
    if frame.high > 0.6 && frame.bass < 0.3 {
        tension += 0.15;
    }
    clamp01(tension)
}

fn harmonic_density(frame: &AudioFrame) -> f32 {
    let bands = [frame.bass, frame.mid, frame.high];
    let active = bands.iter().filter(|b| **b > 0.3).count() as f32;
    let avg = bands.iter().sum::<f32>() / 3.0;
    clamp01((active / 3.0) * 0.5 + avg * 0.5)
}

fn distance_from_drop(smoothed: f32) -> f32 {
    const DROP: f32 = 0.85;
    if smoothed >= DROP {
        return 0.0;
    }
    ((DROP - smoothed) / DROP).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(energy: f32, section: &str, ts: u64) -> AudioFrame {
        AudioFrame {
            smoothed_energy: energy,
            raw_energy: energy,
            energy,
            bass: 0.5,
            syncopation: 0.5,
            section_type: section.to_string(),
            timestamp_ms: ts,
            ..Default::default()
        }
    }

    #[test]
    fn test_rhythmic_intensity_formula() {
        let mut sensor = PatternSensor::new();
        let mut f = frame(0.5, "verse", 0);
        f.bass = 1.0;
        f.syncopation = 0.5;
        let p = sensor.sense(&f, Vibe::TechnoClub);
        assert!((p.rhythmic_intensity - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_detects_building_energy() {
        let mut sensor = PatternSensor::new();
        let mut last = None;
        for i in 0..10 {
            let p = sensor.sense(&frame(0.3 + i as f32 * 0.03, "verse", i * 33), Vibe::PopRock);
            last = Some(p);
        }
        let p = last.unwrap();
        assert!(p.is_building);
        assert!(!p.is_releasing);
        assert!(p.emotional_tension > 0.3);
    }

    #[test]
    fn test_energy_phase_and_drop_distance() {
        let mut sensor = PatternSensor::new();
        let p = sensor.sense(&frame(0.9, "drop", 0), Vibe::TechnoClub);
        assert_eq!(p.energy_phase, EnergyPhase::Drop);
        assert_eq!(p.distance_from_drop, 0.0);

        let p = sensor.sense(&frame(0.0, "intro", 33), Vibe::TechnoClub);
        assert_eq!(p.energy_phase, EnergyPhase::Valley);
        assert!((p.distance_from_drop - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_moment_urgency() {
        let mut sensor = PatternSensor::new();
        let mut p = sensor.sense(&frame(0.5, "chorus", 0), Vibe::PopRock);
        assert_eq!(moment_urgency(&p), 0.7);
        p.is_drop_active = true;
        assert_eq!(moment_urgency(&p), 1.0);
    }

    #[test]
    fn test_section_change_detection() {
        let mut sensor = PatternSensor::new();
        sensor.sense(&frame(0.5, "verse", 0), Vibe::PopRock);
        sensor.sense(&frame(0.5, "verse", 33), Vibe::PopRock);
        assert!(sensor.section_changed(&frame(0.5, "chorus", 66)));
        assert!(!sensor.section_changed(&frame(0.5, "verse", 66)));
    }
}
